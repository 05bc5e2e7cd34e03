use super::record::RawTable;
use crate::error::FetchError;
use crate::http::*;
use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use tracing::trace;

const CONSENSUS_URL: &str = "http://companyinfo.stock.naver.com/v1/company/ajax/cF1001.aspx";

/// Upper bound on `rowspan`/`colspan`; larger values are clamped.
const MAX_SPAN: usize = 1000;

lazy_static::lazy_static! {
    static ref TABLE: Selector = Selector::parse("table").expect("table selector");
    static ref HEADER_ROW: Selector = Selector::parse("thead tr").expect("header row selector");
    static ref BODY_ROW: Selector = Selector::parse("tbody tr").expect("body row selector");
    static ref CELL: Selector = Selector::parse("th, td").expect("cell selector");
}

/// Reporting frequency of the consensus table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Period {
    #[default]
    Annual,
    Quarterly,
}

impl Period {
    /// `freq_typ` query parameter.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Annual => "Y",
            Self::Quarterly => "Q",
        }
    }
}

/// Which financial statements the consensus is built on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatementVariant {
    /// Whatever the company reports as its main statement.
    #[default]
    Main,
    GaapStandalone,
    GaapConsolidated,
    IfrsStandalone,
    IfrsConsolidated,
}

impl StatementVariant {
    /// `fin_typ` query parameter.
    pub fn code(&self) -> u8 {
        match self {
            Self::Main => 0,
            Self::GaapStandalone => 1,
            Self::GaapConsolidated => 2,
            Self::IfrsStandalone => 3,
            Self::IfrsConsolidated => 4,
        }
    }
}

/// Source of raw consensus tables.
#[async_trait]
pub trait Fetcher {
    async fn fetch(
        &self,
        ticker: &str,
        period: Period,
        variant: StatementVariant,
    ) -> Result<RawTable, FetchError>;
}

/// Fetches the consensus table from the Naver Finance company-info widget.
pub struct NaverFetcher {
    http_client: HttpClient,
}

impl NaverFetcher {
    pub fn new(http_client: HttpClient) -> Self {
        Self { http_client }
    }
}

#[async_trait]
impl Fetcher for NaverFetcher {
    async fn fetch(
        &self,
        ticker: &str,
        period: Period,
        variant: StatementVariant,
    ) -> Result<RawTable, FetchError> {
        let fin_typ = variant.code().to_string();
        let response = self
            .http_client
            .get(CONSENSUS_URL)
            .query(&[
                ("cmp_cd", ticker),
                ("fin_typ", fin_typ.as_str()),
                ("freq_typ", period.code()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(FetchError::Status {
                status: response.status(),
                url: response.url().to_string(),
            });
        }

        let html = response.text().await?;
        trace!("[{ticker}] consensus page fetched, {} bytes", html.len());

        parse_table(&html)
    }
}

/// Parse the first `<table>` of a page into a [`RawTable`].
///
/// Header rows are laid out on a grid honouring `rowspan` & `colspan`, so every column gets one
/// token per header row it sits under (repeats from spanning cells collapsed).
pub fn parse_table(html: &str) -> Result<RawTable, FetchError> {
    let document = Html::parse_document(html);
    let table = document.select(&TABLE).next().ok_or(FetchError::MissingTable)?;

    let header_rows: Vec<ElementRef> = table.select(&HEADER_ROW).collect();
    if header_rows.is_empty() {
        return Err(FetchError::MissingHeader);
    }
    let headers = expand_headers(&header_rows);

    let rows = table
        .select(&BODY_ROW)
        .map(|tr| tr.select(&CELL).map(cell_text).collect::<Vec<String>>())
        .filter(|row| !row.is_empty())
        .collect();

    Ok(RawTable { headers, rows })
}

fn expand_headers(rows: &[ElementRef]) -> Vec<Vec<String>> {
    let mut grid: Vec<Vec<Option<String>>> = vec![Vec::new(); rows.len()];

    for (r, tr) in rows.iter().enumerate() {
        let mut c = 0;
        for cell in tr.select(&CELL) {
            // skip slots taken by a rowspan from above
            while matches!(grid[r].get(c), Some(Some(_))) {
                c += 1;
            }

            let text = cell_text(cell);
            let colspan = span(&cell, "colspan");
            let rowspan = span(&cell, "rowspan");
            for grid_row in grid.iter_mut().skip(r).take(rowspan) {
                for slot in c..c + colspan {
                    if grid_row.len() <= slot {
                        grid_row.resize(slot + 1, None);
                    }
                    grid_row[slot] = Some(text.clone());
                }
            }
            c += colspan;
        }
    }

    let width = grid.iter().map(Vec::len).max().unwrap_or(0);
    (0..width)
        .map(|c| {
            let mut tokens: Vec<String> = Vec::new();
            for token in grid.iter().filter_map(|row| row.get(c).cloned().flatten()) {
                if tokens.last() != Some(&token) {
                    tokens.push(token);
                }
            }
            tokens
        })
        .collect()
}

fn span(cell: &ElementRef, attr: &str) -> usize {
    cell.value()
        .attr(attr)
        .and_then(|n| n.trim().parse::<usize>().ok())
        .filter(|n| *n > 0)
        .unwrap_or(1)
        .min(MAX_SPAN)
}

/// All text nodes of a cell, trimmed and concatenated: `"2024/12\n(E)\n(IFRS연결)"` becomes
/// `"2024/12(E)(IFRS연결)"`.
fn cell_text(cell: ElementRef) -> String {
    cell.text().map(str::trim).collect::<Vec<&str>>().concat()
}
