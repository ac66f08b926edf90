//! Cursor-based pagination over the listing endpoint
//!
//! The service hands out an opaque cursor with every page and a `has_more` flag.
//! Enumeration starts from an empty cursor and ends only when the service reports
//! no more pages. There is no iteration cap; callers that need a bound pass a
//! shutdown handle, which also interrupts a page request that never answers.

use std::future::Future;
use tracing::debug;

use crate::fetcher::{FetcherResult, ListEntry, ListPage};
use crate::shutdown::SharedShutdown;

/// Why a pagination run stopped
#[derive(Debug)]
pub enum PaginationOutcome<T> {
    /// The service reported the last page
    Complete(Vec<T>),
    /// Shutdown was requested before the last page arrived
    Cancelled {
        /// Items gathered before cancellation
        collected: usize,
    },
}

/// Pagination helper for the listing API
pub struct PaginationHelper;

impl PaginationHelper {
    /// Walk every page starting from the empty cursor
    ///
    /// # Arguments
    /// * `fetch_fn` - Async function fetching the page for a cursor
    /// * `map_entry` - Converts a raw entry into an item; `None` drops the entry
    /// * `on_page` - Invoked after each page with the page number and running item count
    /// * `shutdown` - Checked between pages and raced against each page request
    ///
    /// # Returns
    /// All mapped items in discovery order, or the cancellation marker
    ///
    /// # Errors
    /// The first page fetch error aborts the walk; nothing collected so far is returned
    pub async fn paginate_cursor<T, F, Fut, M, P>(
        fetch_fn: F,
        mut map_entry: M,
        mut on_page: P,
        shutdown: Option<&SharedShutdown>,
    ) -> FetcherResult<PaginationOutcome<T>>
    where
        F: Fn(String) -> Fut,
        Fut: Future<Output = FetcherResult<ListPage>>,
        M: FnMut(ListEntry) -> Option<T>,
        P: FnMut(usize, usize, bool),
    {
        let mut items = Vec::new();
        let mut cursor = String::new();
        let mut page_number = 0usize;

        loop {
            if shutdown.is_some_and(|s| s.is_shutdown_requested()) {
                debug!(collected = items.len(), "Pagination cancelled by shutdown");
                return Ok(PaginationOutcome::Cancelled {
                    collected: items.len(),
                });
            }

            page_number += 1;
            debug!(page = page_number, cursor = %cursor, "Fetching listing page");

            let fetch = fetch_fn(cursor.clone());
            let page = match shutdown {
                Some(shutdown) => {
                    tokio::select! {
                        page = fetch => page?,
                        _ = shutdown.wait_for_shutdown() => {
                            debug!(
                                page = page_number,
                                collected = items.len(),
                                "Page request abandoned for shutdown"
                            );
                            return Ok(PaginationOutcome::Cancelled {
                                collected: items.len(),
                            });
                        }
                    }
                }
                None => fetch.await?,
            };
            let received = page.entries.len();
            items.extend(page.entries.into_iter().filter_map(&mut map_entry));

            debug!(
                page = page_number,
                received,
                total = items.len(),
                "Listing page processed"
            );

            match page.next_cursor {
                Some(next) => {
                    on_page(page_number, items.len(), true);
                    cursor = next;
                }
                None => {
                    on_page(page_number, items.len(), false);
                    return Ok(PaginationOutcome::Complete(items));
                }
            }
        }
    }
}
