use crate::domain::model::{ProjectSelector, Selector, Workbook, WorkbookSelector};
use crate::domain::ports::WorkbookService;
use crate::utils::error::Result;

/// Resolves a selector into the workbooks whose degradations get reported,
/// in the order they will be visited.
pub async fn select_workbooks<S>(service: &S, selector: &Selector) -> Result<Vec<Workbook>>
where
    S: WorkbookService + ?Sized,
{
    let all_workbooks = service.list_workbooks().await?;
    tracing::debug!("Server returned {} workbooks", all_workbooks.len());

    if let Some(WorkbookSelector::Id(id)) = &selector.workbook {
        let workbook = match service.get_workbook(id).await? {
            Some(workbook) => workbook,
            None => {
                tracing::info!("Workbook {} not found, nothing to report", id);
                return Ok(Vec::new());
            }
        };

        if selector.project_matches(&workbook) {
            return Ok(vec![workbook]);
        }
        tracing::info!(
            "Workbook {} is not in the requested project, nothing to report",
            id
        );
        return Ok(Vec::new());
    }

    let name = match &selector.workbook {
        Some(WorkbookSelector::Name(name)) => Some(name.as_str()),
        _ => None,
    };
    Ok(filter_workbooks(all_workbooks, name, selector.project.as_ref()))
}

/// 名稱與 project 的篩選；依 id 指定的情況由 `select_workbooks` 處理
///
/// With a name only the first match (list order) is kept.
pub fn filter_workbooks(
    all_workbooks: Vec<Workbook>,
    name: Option<&str>,
    project: Option<&ProjectSelector>,
) -> Vec<Workbook> {
    let project_matches = |wb: &Workbook| project.map_or(true, |p| p.matches(wb));

    match name {
        Some(name) => all_workbooks
            .into_iter()
            .find(|wb| wb.name == name && project_matches(wb))
            .into_iter()
            .collect(),
        None => all_workbooks.into_iter().filter(|wb| project_matches(wb)).collect(),
    }
}
