use std::path::PathBuf;

pub const BANKS_URL: &str = "https://web.archive.org/web/20230908091635%20/https://en.wikipedia.org/wiki/List_of_largest_banks";
pub const GDP_URL: &str = "https://web.archive.org/web/20230902185326/https://en.wikipedia.org/wiki/List_of_countries_by_GDP_%28nominal%29";

/// Which scraped table the run targets. Decides the row layout and conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Dataset {
    /// Largest banks by market capitalisation
    Banks,
    /// Countries by nominal GDP
    Gdp,
}

/// Where the page body comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageSource {
    Url(String),
    /// A saved copy of the page on disk.
    File(PathBuf),
}

impl PageSource {
    /// `http://` and `https://` become URLs, anything else is a file path.
    pub fn parse(arg: &str) -> Self {
        if arg.starts_with("http://") || arg.starts_with("https://") {
            PageSource::Url(arg.to_string())
        } else {
            PageSource::File(PathBuf::from(arg))
        }
    }
}

/// How to find the data table among all `<tbody>` elements on the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableLocator {
    /// n-th table body in document order. Pinned to the archived snapshot layout.
    Index(usize),
    /// First table body with a header cell containing this text.
    Header(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CurrencyTarget {
    pub code: String,
    pub column: String,
}

impl CurrencyTarget {
    fn market_cap(code: &str) -> Self {
        Self {
            code: code.to_string(),
            column: format!("MC_{}_Billion", code),
        }
    }
}

/// Conversion applied between extraction and loading.
#[derive(Debug, Clone, PartialEq)]
pub enum Conversion {
    /// Derive one column per target currency from a USD column.
    Currency {
        rates_path: PathBuf,
        source_column: String,
        targets: Vec<CurrencyTarget>,
    },
    /// Strip thousands separators, divide, and rename the column in place.
    Units {
        column: String,
        divisor: f64,
        renamed: String,
    },
}

/// Everything a run needs. Passed explicitly to each stage.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub dataset: Dataset,
    pub source: PageSource,
    pub locator: TableLocator,
    pub columns: Vec<String>,
    pub conversion: Conversion,
    pub csv_path: PathBuf,
    pub json_path: Option<PathBuf>,
    pub db_path: PathBuf,
    pub table: String,
    pub log_path: PathBuf,
    pub queries: Vec<String>,
}

impl PipelineConfig {
    pub fn for_dataset(dataset: Dataset) -> Self {
        match dataset {
            Dataset::Banks => Self::banks(),
            Dataset::Gdp => Self::gdp(),
        }
    }

    pub fn banks() -> Self {
        let table = "Largest_banks";
        Self {
            dataset: Dataset::Banks,
            source: PageSource::Url(BANKS_URL.to_string()),
            locator: TableLocator::Index(0),
            columns: vec!["Name".to_string(), "MC_USD_Billion".to_string()],
            conversion: Conversion::Currency {
                rates_path: PathBuf::from("exchange_rate.csv"),
                source_column: "MC_USD_Billion".to_string(),
                targets: ["GBP", "EUR", "INR"]
                    .into_iter()
                    .map(CurrencyTarget::market_cap)
                    .collect(),
            },
            csv_path: PathBuf::from("./Largest_banks_data.csv"),
            json_path: None,
            db_path: PathBuf::from("Banks.db"),
            table: table.to_string(),
            log_path: PathBuf::from("./code_log.txt"),
            queries: vec![
                format!("SELECT * FROM {}", table),
                format!("SELECT AVG(MC_GBP_Billion) FROM {}", table),
                format!("SELECT Name from {} LIMIT 5", table),
            ],
        }
    }

    pub fn gdp() -> Self {
        let table = "Countries_by_GDP";
        Self {
            dataset: Dataset::Gdp,
            source: PageSource::Url(GDP_URL.to_string()),
            locator: TableLocator::Index(2),
            columns: vec!["Country".to_string(), "GDP_USD_millions".to_string()],
            conversion: Conversion::Units {
                column: "GDP_USD_millions".to_string(),
                divisor: 1000.0,
                renamed: "GDP_USD_billions".to_string(),
            },
            csv_path: PathBuf::from("./Countries_by_GDP.csv"),
            json_path: None,
            db_path: PathBuf::from("World_Economies.db"),
            table: table.to_string(),
            log_path: PathBuf::from("./etl_project_log.txt"),
            queries: vec![format!(
                "SELECT * FROM {} WHERE GDP_USD_billions >= 100",
                table
            )],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_source_detects_urls() {
        assert_eq!(
            PageSource::parse("https://example.org/x"),
            PageSource::Url("https://example.org/x".to_string())
        );
        assert_eq!(
            PageSource::parse("snapshots/banks.html"),
            PageSource::File(PathBuf::from("snapshots/banks.html"))
        );
    }

    #[test]
    fn banks_preset_targets_three_currencies() {
        let config = PipelineConfig::for_dataset(Dataset::Banks);
        assert_eq!(config.locator, TableLocator::Index(0));
        let Conversion::Currency { targets, .. } = &config.conversion else {
            panic!("banks should convert currencies");
        };
        let columns: Vec<&str> = targets.iter().map(|t| t.column.as_str()).collect();
        assert_eq!(columns, ["MC_GBP_Billion", "MC_EUR_Billion", "MC_INR_Billion"]);
        assert_eq!(config.queries.len(), 3);
    }

    #[test]
    fn gdp_preset_uses_third_table_body() {
        let config = PipelineConfig::for_dataset(Dataset::Gdp);
        assert_eq!(config.locator, TableLocator::Index(2));
        assert_eq!(config.table, "Countries_by_GDP");
        assert!(config.queries[0].contains(">= 100"));
    }
}
