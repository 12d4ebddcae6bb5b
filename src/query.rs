use std::fmt;
use std::str::FromStr;

pub const DEFAULT_PAGE_SIZE: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompletedFilter {
    #[default]
    All,
    Completed,
    Pending,
}

impl CompletedFilter {
    /// Query value sent to the backend; `All` sends nothing
    pub fn as_query_value(self) -> Option<&'static str> {
        match self {
            CompletedFilter::All => None,
            CompletedFilter::Completed => Some("true"),
            CompletedFilter::Pending => Some("false"),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CompletedFilter::All => "All",
            CompletedFilter::Completed => "Completed",
            CompletedFilter::Pending => "Pending",
        }
    }

    pub fn cycle(self) -> Self {
        match self {
            CompletedFilter::All => CompletedFilter::Pending,
            CompletedFilter::Pending => CompletedFilter::Completed,
            CompletedFilter::Completed => CompletedFilter::All,
        }
    }
}

impl FromStr for CompletedFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(CompletedFilter::All),
            "true" | "completed" | "done" => Ok(CompletedFilter::Completed),
            "false" | "pending" | "todo" => Ok(CompletedFilter::Pending),
            other => Err(format!("expected all, true or false (got '{}')", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderBy {
    #[default]
    Date,
    Priority,
}

impl OrderBy {
    pub fn as_str(self) -> &'static str {
        match self {
            OrderBy::Date => "date",
            OrderBy::Priority => "priority",
        }
    }

    pub fn toggle(self) -> Self {
        match self {
            OrderBy::Date => OrderBy::Priority,
            OrderBy::Priority => OrderBy::Date,
        }
    }
}

impl FromStr for OrderBy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "date" => Ok(OrderBy::Date),
            "priority" => Ok(OrderBy::Priority),
            other => Err(format!("expected date or priority (got '{}')", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderDirection {
    #[default]
    Asc,
    Desc,
}

impl OrderDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            OrderDirection::Asc => "asc",
            OrderDirection::Desc => "desc",
        }
    }

    pub fn toggle(self) -> Self {
        match self {
            OrderDirection::Asc => OrderDirection::Desc,
            OrderDirection::Desc => OrderDirection::Asc,
        }
    }
}

impl FromStr for OrderDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "asc" => Ok(OrderDirection::Asc),
            "desc" => Ok(OrderDirection::Desc),
            other => Err(format!("expected asc or desc (got '{}')", other)),
        }
    }
}

/// Filter, sort and pagination parameters for `GET /todos`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub search: String,
    pub completed: CompletedFilter,
    pub order_by: OrderBy,
    pub order_direction: OrderDirection,
    pub page: u32,
    pub page_size: u32,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            search: String::new(),
            completed: CompletedFilter::All,
            order_by: OrderBy::Date,
            order_direction: OrderDirection::Asc,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// A single parameter change
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryChange {
    Search(String),
    Completed(CompletedFilter),
    OrderBy(OrderBy),
    OrderDirection(OrderDirection),
    Page(u32),
    PageSize(u32),
}

impl ListQuery {
    pub fn with_page_size(page_size: u32) -> Self {
        Self {
            page_size: page_size.max(1),
            ..Self::default()
        }
    }

    /// Apply a change. Returns false when the value was already current.
    ///
    /// Filter and sort changes move back to the first page.
    pub fn apply(&mut self, change: QueryChange) -> bool {
        match change {
            QueryChange::Search(search) => {
                if self.search == search {
                    return false;
                }
                self.search = search;
                self.page = 1;
            }
            QueryChange::Completed(completed) => {
                if self.completed == completed {
                    return false;
                }
                self.completed = completed;
                self.page = 1;
            }
            QueryChange::OrderBy(order_by) => {
                if self.order_by == order_by {
                    return false;
                }
                self.order_by = order_by;
                self.page = 1;
            }
            QueryChange::OrderDirection(direction) => {
                if self.order_direction == direction {
                    return false;
                }
                self.order_direction = direction;
                self.page = 1;
            }
            QueryChange::Page(page) => {
                let page = page.max(1);
                if self.page == page {
                    return false;
                }
                self.page = page;
            }
            QueryChange::PageSize(page_size) => {
                let page_size = page_size.max(1);
                if self.page_size == page_size {
                    return false;
                }
                self.page_size = page_size;
                self.page = 1;
            }
        }
        true
    }

    /// Query string pairs, all current parameters included
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::with_capacity(6);
        if !self.search.trim().is_empty() {
            pairs.push(("search", self.search.clone()));
        }
        if let Some(completed) = self.completed.as_query_value() {
            pairs.push(("completed", completed.to_string()));
        }
        pairs.push(("orderBy", self.order_by.as_str().to_string()));
        pairs.push(("orderDirection", self.order_direction.as_str().to_string()));
        pairs.push(("page", self.page.to_string()));
        pairs.push(("pageSize", self.page_size.to_string()));
        pairs
    }
}

impl fmt::Display for ListQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let search = if self.search.is_empty() { "-" } else { self.search.as_str() };
        write!(
            f,
            "Search: {} | Show: {} | Sort: {} {} | Page {}",
            search,
            self.completed.label(),
            self.order_by.as_str(),
            self.order_direction.as_str(),
            self.page,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_query_omits_search_and_completed() {
        let pairs = ListQuery::default().to_pairs();
        let keys: Vec<_> = pairs.iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, vec!["orderBy", "orderDirection", "page", "pageSize"]);
    }

    #[test]
    fn every_parameter_is_sent_after_a_single_change() {
        let mut query = ListQuery::default();
        query.apply(QueryChange::Search("milk".to_string()));
        query.apply(QueryChange::Completed(CompletedFilter::Pending));

        let pairs = query.to_pairs();
        assert!(pairs.contains(&("search", "milk".to_string())));
        assert!(pairs.contains(&("completed", "false".to_string())));
        assert!(pairs.contains(&("orderBy", "date".to_string())));
        assert!(pairs.contains(&("orderDirection", "asc".to_string())));
        assert!(pairs.contains(&("page", "1".to_string())));
        assert!(pairs.contains(&("pageSize", "10".to_string())));
    }

    #[test]
    fn unchanged_value_reports_no_change() {
        let mut query = ListQuery::default();
        assert!(!query.apply(QueryChange::OrderBy(OrderBy::Date)));
        assert!(query.apply(QueryChange::OrderBy(OrderBy::Priority)));
    }

    #[test]
    fn filter_change_resets_page() {
        let mut query = ListQuery::default();
        query.apply(QueryChange::Page(3));
        assert_eq!(query.page, 3);
        query.apply(QueryChange::OrderDirection(OrderDirection::Desc));
        assert_eq!(query.page, 1);
    }

    #[test]
    fn page_never_drops_below_one() {
        let mut query = ListQuery::default();
        assert!(!query.apply(QueryChange::Page(0)));
        assert_eq!(query.page, 1);
    }

    #[test]
    fn completed_filter_parses_cli_values() {
        assert_eq!("true".parse::<CompletedFilter>(), Ok(CompletedFilter::Completed));
        assert_eq!("false".parse::<CompletedFilter>(), Ok(CompletedFilter::Pending));
        assert_eq!("ALL".parse::<CompletedFilter>(), Ok(CompletedFilter::All));
        assert!("maybe".parse::<CompletedFilter>().is_err());
    }
}
