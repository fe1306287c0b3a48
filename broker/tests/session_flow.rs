//! Session tests against the mock transport: no live connection needed.

use std::panic::{self, AssertUnwindSafe};

use degiro::{Interval, PRODUCT, Product};
use degiro_broker::mock::{MockTransport, MockTransportBuilder};
use degiro_broker::{
    Credentials, DegiroClient, DegiroError, Endpoints, HttpResponse, Method, Session,
};
use serde_json::{Value, json};

const TOKEN: &str = "TOKEN.prod_1";
const ACCOUNT: i64 = 1234;
const COOKIE: &str = "JSESSIONID=TOKEN.prod_1";

fn credentials() -> Credentials {
    Credentials::new("alice", "s3cret")
}

fn client(transport: &MockTransport) -> DegiroClient<&MockTransport> {
    DegiroClient::new(transport, Endpoints::default())
}

fn snapshot() -> Value {
    let attr = |name: &str, value: Value| json!({"name": name, "value": value});
    json!({
        "portfolio": {"value": [
            {"value": [attr("id", json!("100")), attr("positionType", json!("PRODUCT")),
                       attr("size", json!(3)), attr("price", json!(20.0)), attr("value", json!(60.0)),
                       attr("breakEvenPrice", json!(18.0))]},
            {"value": [attr("id", json!("200")), attr("positionType", json!("PRODUCT")),
                       attr("size", json!(0)), attr("price", json!(5.0)), attr("value", json!(0.0))]},
            {"value": [attr("id", json!("FLATEX_EUR")), attr("positionType", json!("CASH")),
                       attr("size", json!(15.0)), attr("value", json!(15.0))]},
        ]},
        "cashFunds": {"value": [
            {"value": [attr("id", json!(1)), attr("currencyCode", json!("EUR")), attr("value", json!(100.0))]},
            {"value": [attr("id", json!(2)), attr("currencyCode", json!("USD")), attr("value", json!(0))]},
        ]},
    })
}

fn product_info() -> Value {
    json!({"data": {"100": {
        "id": "100", "name": "Acme Bond", "symbol": "ACME",
        "currency": "EUR", "contractSize": 10.0, "vwdId": "350015372",
    }}})
}

fn full_mock() -> MockTransportBuilder {
    MockTransport::builder()
        .with_login(TOKEN, ACCOUNT)
        .respond("/v5/update/", HttpResponse::json(200, &snapshot()))
        .respond_to(Method::Post, "/products/info", HttpResponse::json(200, &product_info()))
}

// ============================================================================
// Login
// ============================================================================

#[test]
fn login_sends_credentials_and_reads_cookie() {
    let mock = full_mock().build();
    let session = Session::open(client(&mock), &credentials()).unwrap();
    assert_eq!(session.account_id(), ACCOUNT);
    assert_eq!(session.context().token.as_str(), TOKEN);

    let login = &mock.requests_to("/login/secure/login")[0];
    assert_eq!(login.method, Method::Post);
    let body: Value = serde_json::from_str(login.body.as_deref().unwrap()).unwrap();
    assert_eq!(body["username"], "alice");
    assert_eq!(body["password"], "s3cret");
    assert_eq!(body["isPassCodeReset"], false);
    assert_eq!(body["isRedirectToMobile"], false);
    assert_eq!(login.header_value("Cookie"), None);

    let client_req = &mock.requests_to("/pa/secure/client")[0];
    assert_eq!(client_req.query_value("sessionId"), Some(TOKEN));
    assert_eq!(client_req.header_value("Cookie"), Some(COOKIE));
}

#[test]
fn login_rejected_is_authentication_error() {
    let mock = MockTransport::builder()
        .respond("/login/secure/login", HttpResponse::new(400, "{}"))
        .build();
    let err = Session::open(client(&mock), &credentials()).err().unwrap();
    assert!(matches!(err, DegiroError::Authentication(_)));
}

#[test]
fn login_without_cookie_is_authentication_error() {
    let mock = MockTransport::builder()
        .respond("/login/secure/login", HttpResponse::new(200, "{}"))
        .build();
    let err = Session::open(client(&mock), &credentials()).err().unwrap();
    assert!(matches!(err, DegiroError::Authentication(_)));
}

#[test]
fn account_id_missing_is_lookup_error() {
    let mock = MockTransport::builder()
        .respond(
            "/login/secure/login",
            HttpResponse::new(200, "{}").with_cookie("JSESSIONID=x; Path=/"),
        )
        .respond("/pa/secure/client", HttpResponse::json(200, &json!({"data": {}})))
        .build();
    let err = Session::open(client(&mock), &credentials()).err().unwrap();
    assert!(matches!(
        err,
        DegiroError::Lookup {
            field: "data.intAccount",
            ..
        }
    ));
}

// ============================================================================
// Snapshot and normalization
// ============================================================================

#[test]
fn snapshot_is_cached_until_refresh() {
    let mock = full_mock().build();
    let mut session = Session::open(client(&mock), &credentials()).unwrap();

    session.snapshot().unwrap();
    session.cash_funds().unwrap();
    session.portfolio().unwrap();
    assert_eq!(mock.requests_to("/v5/update/").len(), 1);

    session.refresh().unwrap();
    assert_eq!(mock.requests_to("/v5/update/").len(), 2);
}

#[test]
fn portfolio_after_snapshot_reuses_cached_data() {
    let mock = full_mock().build();
    let mut session = Session::open(client(&mock), &credentials()).unwrap();

    session.portfolio().unwrap();
    session.snapshot().unwrap();
    session.portfolio().unwrap();
    assert_eq!(mock.requests_to("/v5/update/").len(), 1);
}

#[test]
fn update_request_places_token_in_path_and_query() {
    let mock = full_mock().build();
    let mut session = Session::open(client(&mock), &credentials()).unwrap();
    session.snapshot().unwrap();

    let req = &mock.requests_to("/v5/update/")[0];
    assert!(req.url.ends_with(&format!("/v5/update/{ACCOUNT};jsessionid={TOKEN}")));
    assert_eq!(req.query_value("cashFunds"), Some("0"));
    assert_eq!(req.query_value("intAccount"), Some("1234"));
    assert_eq!(req.query_value("sessionId"), Some(TOKEN));
    assert_eq!(req.header_value("Cookie"), Some(COOKIE));
}

#[test]
fn portfolio_merges_product_info_in_one_request() {
    let mock = full_mock().build();
    let mut session = Session::open(client(&mock), &credentials()).unwrap();
    let portfolio = session.portfolio().unwrap();

    let info_requests = mock.requests_to("/products/info");
    assert_eq!(info_requests.len(), 1);
    assert_eq!(info_requests[0].body.as_deref(), Some(r#"["100"]"#));
    assert_eq!(info_requests[0].query_value("intAccount"), Some("1234"));
    assert_eq!(info_requests[0].query_value("sessionId"), Some(TOKEN));
    assert_eq!(info_requests[0].header_value("Cookie"), Some(COOKIE));

    let products = portfolio.group(PRODUCT).unwrap();
    assert_eq!(products.len(), 1, "zero-size position must be dropped");
    let bond = &products["100"];
    assert_eq!(bond.size, 30.0);
    assert_eq!(bond.name(), Some("Acme Bond"));
    assert!(portfolio.group("CASH").unwrap().contains_key("FLATEX_EUR"));
}

#[test]
fn summary_uses_base_currency_cash() {
    let mock = full_mock().build();
    let mut session = Session::open(client(&mock), &credentials()).unwrap();
    let (summary, cash) = session.portfolio_summary("EUR").unwrap();

    assert_eq!(cash.len(), 1);
    assert_eq!(summary.rows.len(), 1);
    assert_eq!(summary.rows[0].allocation_pct, Some(100.0));
    assert_eq!(summary.rows[0].quantity, 30.0);
    // 60 (product) + 15 (CASH position) + 100 (EUR fund)
    assert_eq!(summary.grand_total, 175.0);
}

#[test]
fn failed_data_request_carries_status_and_operation() {
    let mock = MockTransport::builder()
        .with_login(TOKEN, ACCOUNT)
        .respond("/v5/update/", HttpResponse::new(503, ""))
        .build();
    let mut session = Session::open(client(&mock), &credentials()).unwrap();
    let err = session.snapshot().unwrap_err();
    assert!(matches!(
        err,
        DegiroError::Request {
            operation: "get data",
            status: 503
        }
    ));
}

// ============================================================================
// Products and prices
// ============================================================================

#[test]
fn search_product_uses_limit_and_query() {
    let mock = MockTransport::builder()
        .with_login(TOKEN, ACCOUNT)
        .respond(
            "/products/lookup",
            HttpResponse::json(200, &json!({"products": [{"id": 9, "name": "Nine", "vwdId": "abc", "vwdIdSecondary": "999"}]})),
        )
        .build();
    let session = Session::open(client(&mock), &credentials()).unwrap();
    let product = session.search_product("nine").unwrap();
    assert_eq!(product.streaming_id(), Some("999"));

    let req = &mock.requests_to("/products/lookup")[0];
    assert_eq!(req.query_value("searchText"), Some("nine"));
    assert_eq!(req.query_value("limit"), Some("1"));
    assert_eq!(req.query_value("intAccount"), Some("1234"));
    assert_eq!(req.query_value("sessionId"), Some(TOKEN));
    assert_eq!(req.header_value("Cookie"), Some(COOKIE));
}

#[test]
fn unrecognized_search_payload_is_format_error() {
    let mock = MockTransport::builder()
        .with_login(TOKEN, ACCOUNT)
        .respond("/products/lookup", HttpResponse::json(200, &json!({"items": []})))
        .build();
    let session = Session::open(client(&mock), &credentials()).unwrap();
    assert!(matches!(
        session.search_product("x").unwrap_err(),
        DegiroError::Format(_)
    ));
}

#[test]
fn historic_price_fetches_client_id_once() {
    let chart = json!({"series": [{
        "id": "price:issueid:350015372", "type": "time",
        "times": "2021-01-04T00:00:00/P1D", "data": [[0, 10.0], [1, 11.0]],
    }]});
    let mock = full_mock()
        .respond("hchart", HttpResponse::json(200, &chart))
        .build();
    let mut session = Session::open(client(&mock), &credentials()).unwrap();
    let product = Product::from_value(product_info()).unwrap();

    let series = session.historic_price(&product, Interval::Year).unwrap();
    session.historic_price(&product, Interval::Year).unwrap();
    assert_eq!(series.points.len(), 2);

    let config = mock.requests_to("/login/secure/config");
    assert_eq!(config.len(), 1);
    assert_eq!(config[0].header_value("Cookie"), Some(COOKIE));

    let chart_req = &mock.requests_to("hchart")[0];
    assert_eq!(chart_req.query_value("period"), Some("P1Y"));
    assert_eq!(chart_req.query_value("userToken"), Some("1235"));
    assert_eq!(chart_req.header_value("Cookie"), None);
    let series_params: Vec<&str> = chart_req
        .query
        .iter()
        .filter(|(k, _)| k == "series")
        .map(|(_, v)| v.as_str())
        .collect();
    assert_eq!(series_params, ["issueid:350015372", "price:issueid:350015372"]);
}

// ============================================================================
// Teardown
// ============================================================================

#[test]
fn scoped_logs_out_on_success() {
    let mock = full_mock().build();
    let accounts = Session::scoped(client(&mock), &credentials(), |s| {
        Ok::<_, DegiroError>(s.account_id())
    })
    .unwrap();
    assert_eq!(accounts, ACCOUNT);

    let logout = mock.requests_to("/trading/secure/logout");
    assert_eq!(logout.len(), 1);
    assert!(logout[0].url.ends_with(&format!(";jsessionid={TOKEN}")));
    assert_eq!(logout[0].query_value("intAccount"), Some("1234"));
    assert_eq!(logout[0].query_value("sessionId"), Some(TOKEN));
    assert_eq!(logout[0].header_value("Cookie"), Some(COOKIE));
}

#[test]
fn scoped_logs_out_on_failure() {
    let mock = full_mock().build();
    let result: Result<(), DegiroError> = Session::scoped(client(&mock), &credentials(), |_| {
        Err(DegiroError::Authentication("boom".into()))
    });
    assert!(result.is_err());
    assert_eq!(mock.requests_to("/trading/secure/logout").len(), 1);
}

#[test]
fn logout_failure_is_swallowed() {
    let mock = MockTransport::builder()
        .fail("/trading/secure/logout", "connection reset")
        .with_login(TOKEN, ACCOUNT)
        .build();
    let session = Session::open(client(&mock), &credentials()).unwrap();
    session.close();
    assert_eq!(mock.requests_to("/trading/secure/logout").len(), 1);
}

#[test]
fn scoped_logs_out_once_when_closure_panics() {
    let mock = full_mock().build();
    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        Session::scoped(client(&mock), &credentials(), |_| -> Result<(), DegiroError> {
            panic!("report failed")
        })
    }));
    assert!(result.is_err());
    assert_eq!(mock.requests_to("/trading/secure/logout").len(), 1);
}

#[test]
fn dropped_session_logs_out_once() {
    let mock = full_mock().build();
    {
        let mut session = Session::open(client(&mock), &credentials()).unwrap();
        session.snapshot().unwrap();
    }
    assert_eq!(mock.requests_to("/trading/secure/logout").len(), 1);
}

#[test]
fn close_then_drop_logs_out_once() {
    let mock = full_mock().build();
    let session = Session::open(client(&mock), &credentials()).unwrap();
    session.close();
    assert_eq!(mock.requests_to("/trading/secure/logout").len(), 1);
}
