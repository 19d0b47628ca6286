use crate::config::{Dataset, PageSource, PipelineConfig, TableLocator};
use crate::error::{PipelineError, Result};
use crate::structs::{RecordSet, Value};
use crate::transform::parse_number;
use log::debug;
use scraper::{ElementRef, Html, Node, Selector};
use std::fs;

/// Marks a GDP figure the source has no data for.
pub const MISSING_MARKER: &str = "\u{2014}";

/// Fetches the page and scrapes the configured table into a record set.
///
/// # Errors
///
/// Returns `PipelineError::Fetch`/`Http` when the page cannot be retrieved and
/// `PipelineError::Parse` when the table or a designated cell is missing or
/// holds non-numeric text where a number is expected.
pub fn extract(config: &PipelineConfig) -> Result<RecordSet> {
    let html = fetch_page(&config.source)?;
    parse_table(&html, config)
}

/// Reads the raw page body with a single blocking GET, or from disk for a saved page.
pub fn fetch_page(source: &PageSource) -> Result<String> {
    match source {
        PageSource::Url(url) => {
            debug!("GET {}", url);
            let response = reqwest::blocking::get(url)?;
            let status = response.status();
            if !status.is_success() {
                return Err(PipelineError::Http {
                    url: url.clone(),
                    status,
                });
            }
            Ok(response.text()?)
        }
        PageSource::File(path) => {
            debug!("Reading saved page {}", path.display());
            Ok(fs::read_to_string(path)?)
        }
    }
}

/// Parses `html` and builds one record per surviving data row, in page order.
///
/// Rows without `<td>` cells are header or separator rows and are skipped.
/// The GDP layout also skips rows without a country link or with the
/// missing-value marker in the GDP cell; the banks layout has no such filter.
pub fn parse_table(html: &str, config: &PipelineConfig) -> Result<RecordSet> {
    let document = Html::parse_document(html);
    let body = locate_table(&document, &config.locator)?;
    let tr = selector("tr")?;
    let td = selector("td")?;
    let a = selector("a")?;

    let mut records = RecordSet::new(&config.columns);
    let mut seen = 0;
    let mut filtered = 0;
    for row in body.select(&tr) {
        seen += 1;
        let cells: Vec<ElementRef> = row.select(&td).collect();
        if cells.is_empty() {
            continue;
        }
        let values = match config.dataset {
            Dataset::Banks => Some(bank_row(&cells)?),
            Dataset::Gdp => gdp_row(&cells, &a)?,
        };
        match values {
            Some(values) => records.push(values)?,
            None => filtered += 1,
        }
    }

    debug!(
        "Scanned {} rows | kept {} | filtered {}",
        seen,
        records.len(),
        filtered
    );
    Ok(records)
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| PipelineError::Parse(format!("bad selector {}: {:?}", css, e)))
}

fn locate_table<'a>(document: &'a Html, locator: &TableLocator) -> Result<ElementRef<'a>> {
    let tbody = selector("tbody")?;
    let mut bodies = document.select(&tbody);
    match locator {
        TableLocator::Index(index) => bodies.nth(*index).ok_or_else(|| {
            PipelineError::Parse(format!("page has no table body at index {}", index))
        }),
        TableLocator::Header(text) => {
            let th = selector("th")?;
            bodies
                .find(|body| {
                    body.select(&th)
                        .any(|h| h.text().collect::<String>().contains(text.as_str()))
                })
                .ok_or_else(|| {
                    PipelineError::Parse(format!("no table with a header containing {:?}", text))
                })
        }
    }
}

/// Text of the `index`-th direct child node, whether a text node or an element.
fn child_text(element: ElementRef, index: usize) -> Option<String> {
    let node = element.children().nth(index)?;
    match node.value() {
        Node::Text(text) => Some(String::from(&**text)),
        Node::Element(_) => ElementRef::wrap(node).map(|e| e.text().collect()),
        _ => None,
    }
}

/// Name is the third child of cell 1 (after the flag icon and a space).
fn bank_row(cells: &[ElementRef]) -> Result<Vec<Value>> {
    let name = cells
        .get(1)
        .and_then(|cell| child_text(*cell, 2))
        .ok_or_else(|| PipelineError::Parse("bank row has no name in cell 1".to_string()))?;
    let market_cap = cells
        .get(2)
        .and_then(|cell| child_text(*cell, 0))
        .ok_or_else(|| PipelineError::Parse("bank row has no market cap in cell 2".to_string()))?;

    Ok(vec![
        Value::Text(name.trim().to_string()),
        Value::Number(parse_number(&market_cap)?),
    ])
}

fn gdp_row(cells: &[ElementRef], anchor: &Selector) -> Result<Option<Vec<Value>>> {
    let Some(link) = cells.first().and_then(|cell| cell.select(anchor).next()) else {
        return Ok(None);
    };
    let Some(gdp_cell) = cells.get(2) else {
        return Err(PipelineError::Parse(format!(
            "GDP row has {} cells, expected at least 3",
            cells.len()
        )));
    };
    if is_missing(*gdp_cell) {
        return Ok(None);
    }

    let country = child_text(link, 0)
        .ok_or_else(|| PipelineError::Parse("country link has no text".to_string()))?;
    let gdp = child_text(*gdp_cell, 0)
        .ok_or_else(|| PipelineError::Parse(format!("no GDP figure for {}", country)))?;
    Ok(Some(vec![
        Value::Text(country.trim().to_string()),
        Value::Text(gdp.trim().to_string()),
    ]))
}

fn is_missing(cell: ElementRef) -> bool {
    cell.children()
        .any(|node| matches!(node.value(), Node::Text(text) if &**text == MISSING_MARKER))
}
