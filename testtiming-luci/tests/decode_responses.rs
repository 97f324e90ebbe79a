//! Decoding of captured-shape service responses, XSSI prefix included.

use std::time::Duration;

use rstest::rstest;
use testtiming_core::{BuildStatus, TestStatus};
use testtiming_luci::http::GitilesClient;
use testtiming_luci::transport::{self, strip_xssi};
use testtiming_luci::wire::{
    ListBuildersResponse, LogRequest, QueryTestResultsResponse, SearchBuildsResponse,
};
use testtiming_luci::test_results_request;

const SEARCH_BUILDS: &str = r#")]}'
{
  "builds": [
    {
      "id": "8733371232151234561",
      "builder": {"project": "golang", "bucket": "ci", "builder": "x_tools-gotip-linux-amd64"},
      "status": "FAILURE",
      "endTime": "2024-10-15T21:03:11.428Z",
      "output": {
        "properties": {
          "sources": [
            {"gitilesCommit": {"host": "go.googlesource.com", "project": "tools", "id": "aaaaaaaa11112222"}},
            {"gitilesCommit": {"host": "go.googlesource.com", "project": "go", "id": "bbbbbbbb33334444"}}
          ]
        },
        "logs": [{"name": "summary", "viewUrl": "https://logs.example/summary"}]
      },
      "steps": [
        {"name": "go test", "status": "FAILURE", "logs": [{"name": "stdout", "viewUrl": "https://logs.example/step"}]}
      ],
      "infra": {"resultdb": {"hostname": "results.api.cr.dev", "invocation": "invocations/build-8733371232151234561"}}
    },
    {
      "id": 8733371232151234562,
      "builder": {"project": "golang", "bucket": "ci", "builder": "x_tools-gotip-linux-amd64"},
      "status": "SOME_FUTURE_STATUS"
    }
  ],
  "nextPageToken": "tok-2"
}"#;

#[test]
fn search_builds_page_decodes() {
    let page: SearchBuildsResponse =
        serde_json::from_str(strip_xssi(SEARCH_BUILDS)).expect("decode");
    assert_eq!(page.next_page_token, "tok-2");
    assert_eq!(page.builds.len(), 2);

    let first = &page.builds[0];
    assert_eq!(first.id, 8733371232151234561);
    assert_eq!(first.status, BuildStatus::Failure);
    assert_eq!(first.infra.resultdb.hostname, "results.api.cr.dev");
    assert_eq!(first.steps[0].logs[0].view_url, "https://logs.example/step");
    assert!(first.end_time.is_some());
    assert!(first.output.properties.contains_key("sources"));

    let second = &page.builds[1];
    assert_eq!(second.id, 8733371232151234562);
    assert_eq!(second.status, BuildStatus::Unknown);
    assert!(second.end_time.is_none());
    assert!(second.infra.resultdb.invocation.is_empty());
}

#[test]
fn list_builders_page_decodes_without_token() {
    let body = r#")]}'
{"builders":[{"id":{"project":"golang","bucket":"ci","builder":"gotip-linux-amd64"},
  "config":{"properties":"{\"project\":\"go\",\"go_branch\":\"master\",\"target\":{\"goos\":\"linux\",\"goarch\":\"amd64\"}}"}}]}"#;
    let page: ListBuildersResponse = serde_json::from_str(strip_xssi(body)).expect("decode");
    assert!(page.next_page_token.is_empty());
    assert_eq!(page.builders[0].id.builder, "gotip-linux-amd64");
    assert!(page.builders[0].config.properties.contains("go_branch"));
}

#[rstest]
#[case("PASS", TestStatus::Pass)]
#[case("FAIL", TestStatus::Fail)]
#[case("CRASH", TestStatus::Crash)]
#[case("ABORT", TestStatus::Abort)]
#[case("SKIP", TestStatus::Skip)]
#[case("EXONERATED_SOMEHOW", TestStatus::Unknown)]
fn test_status_vocabulary(#[case] wire: &str, #[case] want: TestStatus) {
    let body = format!(
        r#"{{"testResults":[{{"testId":"runtime.TestGC","status":"{wire}","duration":"0.250s"}}]}}"#
    );
    let page: QueryTestResultsResponse = serde_json::from_str(&body).expect("decode");
    assert_eq!(page.test_results[0].status, want);
    assert_eq!(page.test_results[0].duration, Some(Duration::from_millis(250)));
}

#[test]
fn empty_result_page_decodes() {
    let page: QueryTestResultsResponse = serde_json::from_str(strip_xssi(")]}'\n{}")).expect("decode");
    assert!(page.test_results.is_empty());
}

#[test]
fn result_query_targets_one_invocation_with_exact_pattern() {
    let request = test_results_request("invocations/build-1", "pkg/path.Test(Foo)");
    let json = serde_json::to_value(&request).expect("encode");
    assert_eq!(json["invocations"][0], "invocations/build-1");
    assert_eq!(json["predicate"]["testIdRegexp"], r"pkg/path\.Test\(Foo\)");
}

#[test]
fn gitiles_log_url_names_repo_and_committish() {
    let client = GitilesClient::new(transport::agent(), "go.googlesource.com");
    let request = LogRequest {
        project: "tools".into(),
        committish: "refs/heads/master".into(),
        page_size: 1000,
        page_token: "abc123".into(),
    };
    assert_eq!(
        client.log_url(&request),
        "https://go.googlesource.com/tools/+log/refs/heads/master"
    );
}
