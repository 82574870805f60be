//! Search controller state machine.
//!
//! Pure and synchronous: [`SearchState::update`] takes the latest form
//! parameters and says what to do about the network, [`SearchState::complete`]
//! folds a response back in. Every fetch carries the generation it was issued
//! under and responses from older generations are dropped, so whichever input
//! settled last decides what is shown.

use tracing::{debug, warn};

use crate::models::{QueryParams, ResultPage, SearchPage, SearchRequest};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Merge {
    /// Result list becomes this page
    Replace,
    /// Page is added after the pages already held
    Append,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub generation: u64,
    pub request: SearchRequest,
    pub merge: Merge,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Same parameters as before
    Unchanged,
    /// Resolved locally; drop any scheduled fetch
    Cancel,
    /// (Re)start the debounce timer for this fetch
    Debounce(FetchTicket),
    /// Fetch right away, dropping any scheduled fetch
    FetchNow(FetchTicket),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Awaiting {
    generation: u64,
    page: u32,
    merge: Merge,
}

#[derive(Debug)]
pub struct SearchState {
    per_page: u32,
    last: Option<QueryParams>,
    generation: u64,
    awaiting: Option<Awaiting>,
    /// First and last page currently held in `snapshot.repositories`
    loaded: Option<(u32, u32)>,
    /// Item count of each held page, first page first
    page_sizes: Vec<usize>,
    snapshot: ResultPage,
}

impl SearchState {
    pub fn new(per_page: u32) -> Self {
        Self {
            per_page: per_page.max(1),
            last: None,
            generation: 0,
            awaiting: None,
            loaded: None,
            page_sizes: Vec::new(),
            snapshot: ResultPage::default(),
        }
    }

    pub fn snapshot(&self) -> &ResultPage {
        &self.snapshot
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Pages currently held, as an inclusive range
    pub fn loaded_pages(&self) -> Option<(u32, u32)> {
        self.loaded
    }

    pub fn update(&mut self, params: QueryParams) -> Transition {
        let previous = self.last.replace(params.clone());

        if !params.is_searchable() {
            self.generation += 1;
            self.awaiting = None;
            self.loaded = None;
            self.page_sizes.clear();
            self.snapshot = ResultPage::default();
            return Transition::Cancel;
        }

        let continuing = previous
            .as_ref()
            .filter(|p| p.is_searchable() && p.same_query(&params));

        match continuing {
            None => self.start_search(&params),
            Some(previous) if previous.page == params.page => Transition::Unchanged,
            Some(_) => self.change_page(&params),
        }
    }

    /// Apply a finished fetch. Returns false when the response belongs to a
    /// superseded generation and was ignored.
    pub fn complete(&mut self, generation: u64, result: crate::Result<SearchPage>) -> bool {
        let Some(awaiting) = self.awaiting.filter(|a| a.generation == generation) else {
            debug!(
                generation,
                current = self.generation,
                "Discarding stale search response"
            );
            return false;
        };
        self.awaiting = None;

        match result {
            Ok(page) => {
                match awaiting.merge {
                    Merge::Replace => {
                        self.page_sizes = vec![page.items.len()];
                        self.snapshot.repositories = page.items;
                        self.loaded = Some((awaiting.page, awaiting.page));
                    }
                    Merge::Append => {
                        self.page_sizes.push(page.items.len());
                        self.snapshot.repositories.extend(page.items);
                        let first = self.loaded.map_or(awaiting.page, |(first, _)| first);
                        self.loaded = Some((first, awaiting.page));
                    }
                }
                self.snapshot.total_count = page.total_count;
                self.snapshot.error = None;
                self.snapshot.is_loading = false;
            }
            Err(err) => {
                warn!("Search failed: {}", err);
                self.loaded = None;
                self.page_sizes.clear();
                self.snapshot = ResultPage::failed(format!("Failed to fetch repositories: {}", err));
            }
        }
        true
    }

    fn start_search(&mut self, params: &QueryParams) -> Transition {
        self.generation += 1;
        self.loaded = None;
        self.page_sizes.clear();
        self.snapshot = ResultPage::loading();
        debug!(generation = self.generation, term = params.trimmed_term(), "Search scheduled");
        Transition::Debounce(self.ticket(params, params.page, Merge::Replace))
    }

    fn change_page(&mut self, params: &QueryParams) -> Transition {
        let page = params.page.max(1);
        self.generation += 1;

        match self.loaded {
            Some((first, last)) if first <= page && page <= last => {
                // Pages can come back short, so cut by what each one held
                self.page_sizes.truncate((page - first + 1) as usize);
                let keep: usize = self.page_sizes.iter().sum();
                self.snapshot.repositories.truncate(keep);
                self.snapshot.is_loading = false;
                self.awaiting = None;
                self.loaded = Some((first, page));
                Transition::Cancel
            }
            Some((_, last)) if page == last + 1 => {
                self.snapshot.is_loading = true;
                Transition::FetchNow(self.ticket(params, page, Merge::Append))
            }
            _ => {
                self.snapshot.repositories.clear();
                self.snapshot.error = None;
                self.snapshot.is_loading = true;
                self.loaded = None;
                self.page_sizes.clear();
                Transition::FetchNow(self.ticket(params, page, Merge::Replace))
            }
        }
    }

    fn ticket(&mut self, params: &QueryParams, page: u32, merge: Merge) -> FetchTicket {
        self.awaiting = Some(Awaiting {
            generation: self.generation,
            page,
            merge,
        });
        FetchTicket {
            generation: self.generation,
            request: SearchRequest::for_page(params, page, self.per_page),
            merge,
        }
    }
}
