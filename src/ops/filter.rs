use std::cmp::Ordering;
use std::str::FromStr;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::model::todo::{Priority, Todo};

/// Which todos a view starts from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BaseFilter {
    #[default]
    All,
    Active,
    Completed,
}

impl BaseFilter {
    pub fn as_str(self) -> &'static str {
        match self {
            BaseFilter::All => "all",
            BaseFilter::Active => "active",
            BaseFilter::Completed => "completed",
        }
    }

    fn keeps(self, todo: &Todo) -> bool {
        match self {
            BaseFilter::All => true,
            BaseFilter::Active => !todo.completed,
            BaseFilter::Completed => todo.completed,
        }
    }
}

impl FromStr for BaseFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(BaseFilter::All),
            "active" => Ok(BaseFilter::Active),
            "completed" => Ok(BaseFilter::Completed),
            other => Err(format!(
                "unknown filter \"{}\" (expected all, active, or completed)",
                other
            )),
        }
    }
}

/// What to show and in which order
#[derive(Debug, Clone, Default)]
pub struct FilterSpec {
    pub base: BaseFilter,
    /// Exact project name
    pub project: Option<String>,
    /// Exact area name
    pub area: Option<String>,
    /// Matched against the description
    pub query: Option<Regex>,
}

impl FilterSpec {
    /// Whether any filter beyond "all" is active
    pub fn is_filtered(&self) -> bool {
        self.base != BaseFilter::All
            || self.project.is_some()
            || self.area.is_some()
            || self.query.is_some()
    }
}

/// Compile a case-insensitive description search.
pub fn search_regex(pattern: &str) -> Result<Regex, regex::Error> {
    RegexBuilder::new(pattern).case_insensitive(true).build()
}

/// Filter and sort `todos` into the order they are shown.
///
/// Incomplete todos come before completed ones (except in a completed-only
/// view). Completed todos are ordered by newest completion, incomplete ones
/// by priority with unprioritized last. Remaining ties go to the newest
/// creation date, then to the raw text.
pub fn filter(todos: &[Todo], spec: &FilterSpec) -> Vec<Todo> {
    let mut view: Vec<Todo> = todos
        .iter()
        .filter(|t| spec.base.keeps(t))
        .filter(|t| matches_name(t.project_name.as_deref(), spec.project.as_deref()))
        .filter(|t| matches_name(t.area_name.as_deref(), spec.area.as_deref()))
        .filter(|t| spec.query.as_ref().is_none_or(|re| re.is_match(&t.description)))
        .cloned()
        .collect();
    view.sort_by(|a, b| compare(a, b, spec.base));
    view
}

fn matches_name(actual: Option<&str>, wanted: Option<&str>) -> bool {
    match wanted {
        Some(wanted) => actual == Some(wanted),
        None => true,
    }
}

fn compare(a: &Todo, b: &Todo, base: BaseFilter) -> Ordering {
    let status = if base == BaseFilter::Completed {
        Ordering::Equal
    } else {
        a.completed.cmp(&b.completed)
    };
    let rank = if a.completed && b.completed {
        // None sorts below every date, so reversing puts it last
        b.completion_date.cmp(&a.completion_date)
    } else if !a.completed && !b.completed {
        priority_rank(a.priority).cmp(&priority_rank(b.priority))
    } else {
        Ordering::Equal
    };
    status
        .then(rank)
        .then_with(|| b.created_at.cmp(&a.created_at))
        .then_with(|| a.raw_text.cmp(&b.raw_text))
}

fn priority_rank(priority: Option<Priority>) -> usize {
    match priority {
        Some(p) => p as usize,
        None => Priority::ALL.len(),
    }
}

/// Counts for the status line
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TodoStats {
    pub total: usize,
    pub active: usize,
    pub completed: usize,
    /// A status, project, area, or search filter produced the view
    pub filtered: bool,
}

/// Count the todos in `view`, the result of filtering with `spec`.
pub fn stats(view: &[Todo], spec: &FilterSpec) -> TodoStats {
    let completed = view.iter().filter(|t| t.completed).count();
    TodoStats {
        total: view.len(),
        active: view.len() - completed,
        completed,
        filtered: spec.is_filtered(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_line;

    fn descriptions(view: &[Todo]) -> Vec<&str> {
        view.iter().map(|t| t.description.as_str()).collect()
    }

    fn sample() -> Vec<Todo> {
        [
            "(B) 2024-01-01 Second +Work",
            "x 2024-01-05 2024-01-01 Done early @home",
            "(A) 2024-01-01 First +Work @desk",
            "x 2024-01-09 2024-01-01 Done late +Work",
            "2024-01-03 Plain newer",
            "2024-01-02 Plain older @home",
        ]
        .iter()
        .map(|line| parse_line(line))
        .collect()
    }

    #[test]
    fn test_mixed_order() {
        let todos = vec![
            parse_line("(B) 2024-01-01 Prio B"),
            parse_line("(A) 2024-01-01 Prio A"),
            parse_line("x 2024-01-02 2024-01-01 Completed T2"),
            parse_line("x 2024-01-08 2024-01-01 Completed T1"),
        ];
        let view = filter(&todos, &FilterSpec::default());
        assert_eq!(
            descriptions(&view),
            vec!["Prio A", "Prio B", "Completed T1", "Completed T2"]
        );
    }

    #[test]
    fn test_full_order() {
        let view = filter(&sample(), &FilterSpec::default());
        assert_eq!(
            descriptions(&view),
            vec![
                "First",
                "Second",
                "Plain newer",
                "Plain older",
                "Done late",
                "Done early"
            ]
        );
    }

    #[test]
    fn test_base_filters() {
        let todos = sample();
        let active = filter(
            &todos,
            &FilterSpec {
                base: BaseFilter::Active,
                ..Default::default()
            },
        );
        assert!(active.iter().all(|t| !t.completed));
        assert_eq!(active.len(), 4);

        let completed = filter(
            &todos,
            &FilterSpec {
                base: BaseFilter::Completed,
                ..Default::default()
            },
        );
        assert_eq!(descriptions(&completed), vec!["Done late", "Done early"]);
    }

    #[test]
    fn test_project_and_area_are_exact() {
        let todos = sample();
        let work = filter(
            &todos,
            &FilterSpec {
                project: Some("Work".into()),
                ..Default::default()
            },
        );
        assert_eq!(descriptions(&work), vec!["First", "Second", "Done late"]);

        let lower = filter(
            &todos,
            &FilterSpec {
                project: Some("work".into()),
                ..Default::default()
            },
        );
        assert!(lower.is_empty());

        let work_desk = filter(
            &todos,
            &FilterSpec {
                project: Some("Work".into()),
                area: Some("desk".into()),
                ..Default::default()
            },
        );
        assert_eq!(descriptions(&work_desk), vec!["First"]);
    }

    #[test]
    fn test_query_is_case_insensitive() {
        let view = filter(
            &sample(),
            &FilterSpec {
                query: Some(search_regex("^plain").unwrap()),
                ..Default::default()
            },
        );
        assert_eq!(descriptions(&view), vec!["Plain newer", "Plain older"]);
    }

    #[test]
    fn test_missing_completion_date_sorts_last() {
        let todos = vec![
            parse_line("x Undated"),
            parse_line("x 2020-01-01 Old"),
        ];
        let view = filter(&todos, &FilterSpec::default());
        assert_eq!(descriptions(&view), vec!["Old", "Undated"]);
    }

    #[test]
    fn test_raw_text_breaks_ties() {
        let b = parse_line("2024-01-01 bbb");
        let a = parse_line("2024-01-01 aaa");
        let view = filter(&[b, a], &FilterSpec::default());
        assert_eq!(descriptions(&view), vec!["aaa", "bbb"]);
    }

    #[test]
    fn test_filter_is_repeatable() {
        let todos = sample();
        let spec = FilterSpec::default();
        let first = filter(&todos, &spec);
        let second = filter(&todos, &spec);
        assert_eq!(first, second);
    }

    #[test]
    fn test_base_filter_names() {
        for base in [BaseFilter::All, BaseFilter::Active, BaseFilter::Completed] {
            assert_eq!(base.as_str().parse::<BaseFilter>(), Ok(base));
        }
        assert!("done".parse::<BaseFilter>().is_err());
    }

    #[test]
    fn test_stats() {
        let todos = sample();
        let all = filter(&todos, &FilterSpec::default());
        assert_eq!(
            stats(&all, &FilterSpec::default()),
            TodoStats {
                total: 6,
                active: 4,
                completed: 2,
                filtered: false,
            }
        );
        let spec = FilterSpec {
            base: BaseFilter::Active,
            ..Default::default()
        };
        let active = filter(&todos, &spec);
        let s = stats(&active, &spec);
        assert_eq!(s.completed, 0);
        assert!(s.filtered);
    }

    #[test]
    fn test_stats_filtered_even_when_nothing_is_hidden() {
        let todos: Vec<Todo> = ["(A) One +Work", "Two +Work"]
            .into_iter()
            .map(parse_line)
            .collect();
        for spec in [
            FilterSpec {
                base: BaseFilter::Active,
                ..Default::default()
            },
            FilterSpec {
                project: Some("Work".into()),
                ..Default::default()
            },
            FilterSpec {
                query: Some(search_regex("o").unwrap()),
                ..Default::default()
            },
        ] {
            let view = filter(&todos, &spec);
            assert_eq!(view.len(), todos.len());
            assert!(stats(&view, &spec).filtered, "{:?}", spec);
        }
        assert!(!stats(&todos, &FilterSpec::default()).filtered);
    }
}
