//! Test-result store queries.

use crate::wire::{QueryTestResultsRequest, TestResultPredicate};

/// Escape every RE2 metacharacter so `s` matches itself literally.
pub fn quote_meta(s: &str) -> String {
    let mut out = String::with_capacity(s.len() * 2);
    for c in s.chars() {
        if r"\.+*?()|[]{}^$".contains(c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Query for the results of exactly `test_id` inside one invocation.
pub fn test_results_request(invocation: &str, test_id: &str) -> QueryTestResultsRequest {
    QueryTestResultsRequest {
        invocations: vec![invocation.to_string()],
        predicate: TestResultPredicate {
            test_id_regexp: quote_meta(test_id),
        },
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("TestFoo", "TestFoo")]
    #[case("cmd/go.TestScript/list_test_e", r"cmd/go\.TestScript/list_test_e")]
    #[case("a+b*c?", r"a\+b\*c\?")]
    #[case("(x|y)[0]{1}^$", r"\(x\|y\)\[0\]\{1\}\^\$")]
    #[case(r"back\slash", r"back\\slash")]
    fn quote_meta_escapes_re2_syntax(#[case] input: &str, #[case] want: &str) {
        assert_eq!(quote_meta(input), want);
    }

    #[test]
    fn request_scopes_to_one_invocation() {
        let req = test_results_request("invocations/build-42", "runtime.TestGC");
        assert_eq!(req.invocations, vec!["invocations/build-42".to_string()]);
        assert_eq!(req.predicate.test_id_regexp, r"runtime\.TestGC");
    }
}
