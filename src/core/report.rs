use crate::core::degradations::parse_degradations;
use crate::core::selection::select_workbooks;
use crate::domain::model::{DegradationReport, Selector, Workbook, REPORT_HEADER};
use crate::domain::ports::WorkbookService;
use crate::utils::error::Result;
use std::io::Write;

pub async fn fetch_report<S>(
    service: &S,
    workbook: &Workbook,
    product_version: &str,
) -> Result<DegradationReport>
where
    S: WorkbookService + ?Sized,
{
    tracing::debug!(
        "Fetching degradations for workbook {} ({}) at version {}",
        workbook.name,
        workbook.id,
        product_version
    );
    let xml = service.get_degradations(&workbook.id, product_version).await?;
    let degradations = parse_degradations(&xml)?;
    tracing::debug!(
        "Workbook {} has {} degradations",
        workbook.name,
        degradations.len()
    );

    Ok(DegradationReport {
        workbook_name: workbook.name.clone(),
        degradations,
    })
}

/// Writes the header, then one row per degradation of every selected
/// workbook. Returns the number of data rows written.
pub async fn write_report<S, W>(
    service: &S,
    selector: &Selector,
    product_version: &str,
    out: &mut W,
) -> Result<usize>
where
    S: WorkbookService + ?Sized,
    W: Write,
{
    writeln!(out, "{}", REPORT_HEADER)?;

    let workbooks = select_workbooks(service, selector).await?;
    tracing::info!("Reporting degradations for {} workbooks", workbooks.len());

    let mut rows = 0;
    for workbook in &workbooks {
        let report = fetch_report(service, workbook, product_version).await?;
        for row in report.rows() {
            writeln!(out, "{}", row)?;
            rows += 1;
        }
    }
    out.flush()?;

    Ok(rows)
}
