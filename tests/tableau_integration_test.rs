use anyhow::Result;
use httpmock::prelude::*;
use serde_json::json;
use workbook_degradations::{
    app, DegradationError, LogLevel, Password, ProjectSelector, Selector, Settings,
    TableauServer, WorkbookSelector, WorkbookService,
};

const TOKEN: &str = "token-123";
const SITE: &str = "site-1";
const API: &str = "3.19";

fn settings(server: &MockServer, selector: Selector) -> Settings {
    Settings {
        server: server.base_url(),
        username: "admin".to_string(),
        product_version: "2019.3".to_string(),
        site: String::new(),
        api_version: None,
        logging_level: LogLevel::Error,
        selector,
    }
}

fn degradation_xml(names: &[(&str, &str)]) -> String {
    let children: String = names
        .iter()
        .map(|(name, severity)| {
            format!(r#"<degradation name="{}" severity="{}"/>"#, name, severity)
        })
        .collect();
    format!(
        r#"<?xml version='1.0' encoding='UTF-8'?><tsResponse xmlns="http://tableau.com/api"><downgradeInfo>{}</downgradeInfo></tsResponse>"#,
        children
    )
}

fn workbook_json(id: &str, name: &str, project_id: &str, project_name: &str) -> serde_json::Value {
    json!({
        "id": id,
        "name": name,
        "contentUrl": name,
        "project": {"id": project_id, "name": project_name}
    })
}

/// serverinfo, signin and signout mocks shared by every scenario.
struct SessionMocks<'a> {
    server_info: httpmock::Mock<'a>,
    sign_in: httpmock::Mock<'a>,
    sign_out: httpmock::Mock<'a>,
}

fn mock_session(server: &MockServer) -> SessionMocks<'_> {
    let server_info = server.mock(|when, then| {
        when.method(GET).path("/api/2.4/serverinfo");
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(json!({
                "serverInfo": {
                    "productVersion": {"value": "2023.1.0", "build": "20231.23.0301.1234"},
                    "restApiVersion": API
                }
            }));
    });

    let sign_in = server.mock(|when, then| {
        when.method(POST)
            .path(format!("/api/{}/auth/signin", API))
            .body_contains(r#""name":"admin""#)
            .body_contains(r#""password":"secret""#)
            .body_contains(r#""contentUrl":"""#);
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(json!({
                "credentials": {
                    "site": {"id": SITE, "contentUrl": ""},
                    "user": {"id": "user-1"},
                    "token": TOKEN
                }
            }));
    });

    let sign_out = server.mock(|when, then| {
        when.method(POST)
            .path(format!("/api/{}/auth/signout", API))
            .header("x-tableau-auth", TOKEN);
        then.status(204);
    });

    SessionMocks {
        server_info,
        sign_in,
        sign_out,
    }
}

fn mock_workbook_list(server: &MockServer, workbooks: Vec<serde_json::Value>) -> httpmock::Mock<'_> {
    let total = workbooks.len().to_string();
    server.mock(|when, then| {
        when.method(GET)
            .path(format!("/api/{}/sites/{}/workbooks", API, SITE))
            .query_param("pageNumber", "1")
            .header("x-tableau-auth", TOKEN);
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(json!({
                "pagination": {"pageNumber": "1", "pageSize": "100", "totalAvailable": total},
                "workbooks": {"workbook": workbooks}
            }));
    })
}

fn mock_degradations<'a>(
    server: &'a MockServer,
    workbook_id: &str,
    names: &[(&str, &str)],
) -> httpmock::Mock<'a> {
    let body = degradation_xml(names);
    server.mock(|when, then| {
        when.method(GET)
            .path(format!(
                "/api/{}/sites/{}/workbooks/{}/downGradeInfo",
                API, SITE, workbook_id
            ))
            .query_param("productVersion", "2019.3")
            .header("x-tableau-auth", TOKEN);
        then.status(200)
            .header("Content-Type", "application/xml")
            .body(body);
    })
}

async fn run_report(settings: &Settings) -> (workbook_degradations::Result<usize>, String) {
    let mut out = Vec::new();
    let result = app::run(settings, Password::new("secret"), &mut out).await;
    (result, String::from_utf8(out).unwrap())
}

#[tokio::test]
async fn test_all_workbooks_end_to_end() -> Result<()> {
    let server = MockServer::start();
    let session = mock_session(&server);
    let list = mock_workbook_list(
        &server,
        vec![
            workbook_json("w1", "Sales", "p1", "Finance"),
            workbook_json("w2", "Inventory", "p2", "Operations"),
        ],
    );
    let w1 = mock_degradations(
        &server,
        "w1",
        &[("Dashboard Extensions", "Red"), ("Set Actions", "Yellow")],
    );
    let w2 = mock_degradations(&server, "w2", &[("Spatial Join", "Red")]);

    let (result, output) = run_report(&settings(&server, Selector::default())).await;

    assert_eq!(result?, 3);
    assert_eq!(
        output,
        "Workbook Name,Degradation Name,Severity\n\
         \"Sales\",Dashboard Extensions,Red\n\
         \"Sales\",Set Actions,Yellow\n\
         \"Inventory\",Spatial Join,Red\n"
    );
    session.server_info.assert();
    session.sign_in.assert();
    session.sign_out.assert();
    list.assert();
    w1.assert();
    w2.assert();
    Ok(())
}

#[tokio::test]
async fn test_project_name_filters_workbooks() -> Result<()> {
    let server = MockServer::start();
    let session = mock_session(&server);
    let _list = mock_workbook_list(
        &server,
        vec![
            workbook_json("w1", "Sales", "p1", "Finance"),
            workbook_json("w2", "Inventory", "p2", "Operations"),
            workbook_json("w3", "Budget", "p1", "Finance"),
        ],
    );
    let w1 = mock_degradations(&server, "w1", &[("A", "Red")]);
    let w2 = mock_degradations(&server, "w2", &[("B", "Red")]);
    let w3 = mock_degradations(&server, "w3", &[("C", "Red")]);

    let selector = Selector {
        workbook: None,
        project: Some(ProjectSelector::Name("Finance".to_string())),
    };
    let (result, output) = run_report(&settings(&server, selector)).await;

    assert_eq!(result?, 2);
    assert!(output.contains("\"Sales\",A,Red"));
    assert!(output.contains("\"Budget\",C,Red"));
    w1.assert();
    w2.assert_hits(0);
    w3.assert();
    session.sign_out.assert();
    Ok(())
}

#[tokio::test]
async fn test_workbook_id_lookup() -> Result<()> {
    let server = MockServer::start();
    let session = mock_session(&server);
    let list = mock_workbook_list(&server, vec![workbook_json("w1", "Sales", "p1", "Finance")]);
    let get = server.mock(|when, then| {
        when.method(GET)
            .path(format!("/api/{}/sites/{}/workbooks/w1", API, SITE));
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(json!({"workbook": workbook_json("w1", "Sales", "p1", "Finance")}));
    });
    let w1 = mock_degradations(&server, "w1", &[("A", "Red")]);

    let selector = Selector {
        workbook: Some(WorkbookSelector::Id("w1".to_string())),
        project: Some(ProjectSelector::Id("p1".to_string())),
    };
    let (result, output) = run_report(&settings(&server, selector)).await;

    assert_eq!(result?, 1);
    assert!(output.ends_with("\"Sales\",A,Red\n"));
    list.assert();
    get.assert();
    w1.assert();
    session.sign_out.assert();
    Ok(())
}

#[tokio::test]
async fn test_unknown_workbook_id_prints_only_header() -> Result<()> {
    let server = MockServer::start();
    let session = mock_session(&server);
    let _list = mock_workbook_list(&server, vec![]);
    let get = server.mock(|when, then| {
        when.method(GET)
            .path(format!("/api/{}/sites/{}/workbooks/missing", API, SITE));
        then.status(404)
            .header("Content-Type", "application/json")
            .json_body(json!({
                "error": {"summary": "Resource Not Found", "detail": "Workbook not found", "code": "404006"}
            }));
    });

    let selector = Selector {
        workbook: Some(WorkbookSelector::Id("missing".to_string())),
        project: None,
    };
    let (result, output) = run_report(&settings(&server, selector)).await;

    assert_eq!(result?, 0);
    assert_eq!(output, "Workbook Name,Degradation Name,Severity\n");
    get.assert();
    session.sign_out.assert();
    Ok(())
}

#[tokio::test]
async fn test_bad_credentials_are_auth_error() {
    let server = MockServer::start();
    let _server_info = server.mock(|when, then| {
        when.method(GET).path("/api/2.4/serverinfo");
        then.status(200)
            .json_body(json!({"serverInfo": {"restApiVersion": API}}));
    });
    let sign_in = server.mock(|when, then| {
        when.method(POST).path(format!("/api/{}/auth/signin", API));
        then.status(401)
            .header("Content-Type", "application/json")
            .json_body(json!({
                "error": {"summary": "Signin Error", "detail": "Error signing in to Tableau Server", "code": "401001"}
            }));
    });
    let list = mock_workbook_list(&server, vec![]);

    let (result, output) = run_report(&settings(&server, Selector::default())).await;

    match result {
        Err(DegradationError::AuthError { message }) => {
            assert!(message.contains("Signin Error"));
        }
        other => panic!("expected auth error, got {:?}", other),
    }
    assert!(output.is_empty());
    sign_in.assert();
    list.assert_hits(0);
}

#[tokio::test]
async fn test_failed_degradation_fetch_still_signs_out() {
    let server = MockServer::start();
    let session = mock_session(&server);
    let _list = mock_workbook_list(&server, vec![workbook_json("w1", "Sales", "p1", "Finance")]);
    let _failing = server.mock(|when, then| {
        when.method(GET)
            .path(format!("/api/{}/sites/{}/workbooks/w1/downGradeInfo", API, SITE));
        then.status(500).body("internal error");
    });

    let (result, output) = run_report(&settings(&server, Selector::default())).await;

    assert!(matches!(
        result,
        Err(DegradationError::ServerError { status: 500, .. })
    ));
    assert_eq!(output, "Workbook Name,Degradation Name,Severity\n");
    session.sign_out.assert();
}

#[tokio::test]
async fn test_server_info_unavailable_falls_back() -> Result<()> {
    let server = MockServer::start();
    let server_info = server.mock(|when, then| {
        when.method(GET).path("/api/2.4/serverinfo");
        then.status(404);
    });

    let tableau = TableauServer::connect(&server.base_url(), None).await?;

    assert_eq!(tableau.api_version(), "2.4");
    server_info.assert();
    Ok(())
}

#[tokio::test]
async fn test_pinned_api_version_skips_server_info() -> Result<()> {
    let server = MockServer::start();
    let server_info = server.mock(|when, then| {
        when.method(GET).path("/api/2.4/serverinfo");
        then.status(200)
            .json_body(json!({"serverInfo": {"restApiVersion": "3.19"}}));
    });

    let tableau = TableauServer::connect(&server.base_url(), Some("3.4")).await?;

    assert_eq!(tableau.api_version(), "3.4");
    server_info.assert_hits(0);
    Ok(())
}

#[tokio::test]
async fn test_workbook_list_follows_pagination() -> Result<()> {
    let server = MockServer::start();
    let session_mocks = mock_session(&server);
    let page_one = server.mock(|when, then| {
        when.method(GET)
            .path(format!("/api/{}/sites/{}/workbooks", API, SITE))
            .query_param("pageNumber", "1");
        then.status(200).json_body(json!({
            "pagination": {"pageNumber": "1", "pageSize": "100", "totalAvailable": "3"},
            "workbooks": {"workbook": [
                workbook_json("w1", "Sales", "p1", "Finance"),
                workbook_json("w2", "Inventory", "p2", "Operations")
            ]}
        }));
    });
    let page_two = server.mock(|when, then| {
        when.method(GET)
            .path(format!("/api/{}/sites/{}/workbooks", API, SITE))
            .query_param("pageNumber", "2");
        then.status(200).json_body(json!({
            "pagination": {"pageNumber": "2", "pageSize": "100", "totalAvailable": "3"},
            "workbooks": {"workbook": [workbook_json("w3", "Budget", "p1", "Finance")]}
        }));
    });

    let tableau = TableauServer::connect(&server.base_url(), None).await?;
    let credentials = workbook_degradations::Credentials {
        username: "admin".to_string(),
        password: Password::new("secret"),
        site: String::new(),
    };
    let session = tableau.sign_in(&credentials).await?;
    let workbooks = session.list_workbooks().await?;
    session.sign_out().await?;

    let ids: Vec<&str> = workbooks.iter().map(|wb| wb.id.as_str()).collect();
    assert_eq!(ids, vec!["w1", "w2", "w3"]);
    assert_eq!(workbooks[2].project_name, "Finance");
    page_one.assert();
    page_two.assert();
    session_mocks.sign_out.assert();
    Ok(())
}

#[tokio::test]
async fn test_truncated_degradation_body_fails_and_signs_out() {
    let server = MockServer::start();
    let session = mock_session(&server);
    let _list = mock_workbook_list(&server, vec![workbook_json("w1", "Sales", "p1", "Finance")]);
    let truncated = server.mock(|when, then| {
        when.method(GET)
            .path(format!("/api/{}/sites/{}/workbooks/w1/downGradeInfo", API, SITE));
        then.status(200)
            .header("Content-Type", "application/xml")
            .body(r#"<tsResponse><downgradeInfo><degradation name="A" severity="Red"/>"#);
    });

    let (result, output) = run_report(&settings(&server, Selector::default())).await;

    let err = result.expect_err("truncated body must fail the run");
    assert_eq!(err.exit_code(), 1);
    assert_eq!(output, "Workbook Name,Degradation Name,Severity\n");
    truncated.assert();
    session.sign_out.assert();
}
