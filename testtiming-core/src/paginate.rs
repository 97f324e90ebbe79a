//! Page-token driven listing.
//!
//! Every remote listing in this workspace has the same shape: send a request
//! carrying the token from the previous response, stop when the returned token
//! is empty. [`Paginator`] turns such a fetch function into a lazy iterator of
//! items. Pages are fetched only as the iterator is advanced, so a stop
//! predicate that fires mid-page prevents any further request.
//!
//! The iterator fuses after the first fetch error or stop; it does not retry.

use std::vec;

/// One page of a token-chained listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Empty on the last page.
    pub next_page_token: String,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, next_page_token: impl Into<String>) -> Self {
        Self {
            items,
            next_page_token: next_page_token.into(),
        }
    }
}

/// Lazy, finite, non-restartable sequence of items drawn from a paged source.
///
/// `fetch` receives the continuation token (empty for the first page).
/// `stop` is consulted for every item; when it returns `true` the item is not
/// yielded and the listing ends.
pub struct Paginator<T, E, F, S>
where
    F: FnMut(&str) -> Result<Page<T>, E>,
    S: FnMut(&T) -> bool,
{
    fetch: F,
    stop: S,
    next_token: Option<String>,
    buffered: vec::IntoIter<T>,
    pages_fetched: usize,
    done: bool,
}

fn never<T>(_: &T) -> bool {
    false
}

impl<T, E, F> Paginator<T, E, F, fn(&T) -> bool>
where
    F: FnMut(&str) -> Result<Page<T>, E>,
{
    /// Drain every page.
    pub fn new(fetch: F) -> Self {
        Self::with_stop(fetch, never::<T>)
    }
}

impl<T, E, F, S> Paginator<T, E, F, S>
where
    F: FnMut(&str) -> Result<Page<T>, E>,
    S: FnMut(&T) -> bool,
{
    pub fn with_stop(fetch: F, stop: S) -> Self {
        Self {
            fetch,
            stop,
            next_token: Some(String::new()),
            buffered: Vec::new().into_iter(),
            pages_fetched: 0,
            done: false,
        }
    }

    pub fn pages_fetched(&self) -> usize {
        self.pages_fetched
    }

    /// Collect every item, failing on the first fetch error.
    pub fn collect_all(self) -> Result<Vec<T>, E> {
        self.collect()
    }
}

impl<T, E, F, S> Iterator for Paginator<T, E, F, S>
where
    F: FnMut(&str) -> Result<Page<T>, E>,
    S: FnMut(&T) -> bool,
{
    type Item = Result<T, E>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.done {
                return None;
            }
            if let Some(item) = self.buffered.next() {
                if (self.stop)(&item) {
                    self.done = true;
                    return None;
                }
                return Some(Ok(item));
            }
            let Some(token) = self.next_token.take() else {
                self.done = true;
                return None;
            };
            match (self.fetch)(&token) {
                Ok(page) => {
                    self.pages_fetched += 1;
                    if !page.next_page_token.is_empty() {
                        self.next_token = Some(page.next_page_token);
                    }
                    self.buffered = page.items.into_iter();
                }
                Err(err) => {
                    self.done = true;
                    return Some(Err(err));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Three pages chained A → B → C → "".
    fn three_pages(requests: &mut Vec<String>, token: &str) -> Result<Page<u32>, String> {
        requests.push(token.to_string());
        match token {
            "" => Ok(Page::new(vec![1, 2], "B")),
            "B" => Ok(Page::new(vec![3], "C")),
            "C" => Ok(Page::new(vec![4, 5], "")),
            other => Err(format!("unexpected token {other}")),
        }
    }

    #[test]
    fn follows_tokens_until_empty() {
        let mut requests = Vec::new();
        let items = Paginator::new(|t: &str| three_pages(&mut requests, t))
            .collect_all()
            .expect("collect");
        assert_eq!(items, vec![1, 2, 3, 4, 5]);
        assert_eq!(requests, vec!["", "B", "C"]);
    }

    #[test]
    fn stop_predicate_halts_without_further_fetches() {
        let mut requests = Vec::new();
        let mut pager = Paginator::with_stop(|t: &str| three_pages(&mut requests, t), |n| *n == 3);
        let items: Vec<u32> = pager.by_ref().map(|r| r.expect("item")).collect();
        assert_eq!(items, vec![1, 2]);
        assert_eq!(pager.pages_fetched(), 2);
        assert!(pager.next().is_none());
        drop(pager);
        assert_eq!(requests, vec!["", "B"]);
    }

    #[test]
    fn empty_pages_are_skipped() {
        let mut calls = 0;
        let items = Paginator::new(|t: &str| {
            calls += 1;
            Ok::<_, String>(match t {
                "" => Page::new(vec![], "next"),
                _ => Page::new(vec!['x'], ""),
            })
        })
        .collect_all()
        .expect("collect");
        assert_eq!(items, vec!['x']);
        assert_eq!(calls, 2);
    }

    #[test]
    fn error_is_yielded_once_then_fused() {
        let mut calls = 0;
        let mut pager = Paginator::new(|t: &str| {
            calls += 1;
            match t {
                "" => Ok(Page::new(vec![7], "boom")),
                _ => Err("transport down".to_string()),
            }
        });
        assert_eq!(pager.next(), Some(Ok(7)));
        assert_eq!(pager.next(), Some(Err("transport down".to_string())));
        assert_eq!(pager.next(), None);
        drop(pager);
        assert_eq!(calls, 2);
    }
}
