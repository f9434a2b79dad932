use crate::model::todo::Todo;
use crate::parse::date::format_date;

/// Format a todo as its canonical line.
///
/// Order: `x <completion date> <created>` for completed todos, otherwise
/// `(X) <created>`; then description, `+project`, `@area`, and `key:value`
/// pairs in insertion order. A completed todo without a completion date
/// drops the date block, since a lone date after `x ` reads back as the
/// completion date.
pub fn format_line(todo: &Todo) -> String {
    let mut parts: Vec<String> = Vec::new();

    if todo.completed {
        parts.push("x".to_string());
        if let Some(ref done) = todo.completion_date {
            parts.push(format_date(done));
            parts.push(format_date(&todo.created_at));
        }
    } else {
        if let Some(priority) = todo.priority {
            parts.push(format!("({})", priority));
        }
        parts.push(format_date(&todo.created_at));
    }

    parts.push(todo.description.clone());

    if let Some(ref project) = todo.project_name {
        parts.push(format!("+{}", project));
    }
    if let Some(ref area) = todo.area_name {
        parts.push(format!("@{}", area));
    }
    for (key, value) in &todo.metadata {
        parts.push(format!("{}:{}", key, value));
    }
    if let Some(ref due) = todo.due_date
        && !todo.metadata.contains_key("due")
    {
        parts.push(format!("due:{}", format_date(due)));
    }

    collapse_whitespace(&parts.join(" "))
}

/// Format todos as todo.txt file content, one newline-terminated line each.
pub fn format_file(todos: &[Todo]) -> String {
    let mut out = String::new();
    for todo in todos {
        out.push_str(&format_line(todo));
        out.push('\n');
    }
    out
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::todo::{MetaValue, Priority};
    use crate::parse::date::parse_date_token;
    use crate::parse::line_parser::parse_line;
    use pretty_assertions::assert_eq;

    fn dated(description: &str, created: &str) -> Todo {
        let mut todo = Todo::new(description);
        todo.created_at = parse_date_token(created).unwrap();
        todo
    }

    #[test]
    fn test_format_minimal() {
        let todo = dated("Buy milk", "2024-03-01");
        assert_eq!(format_line(&todo), "2024-03-01 Buy milk");
    }

    #[test]
    fn test_format_full_incomplete() {
        let mut todo = dated("Call Mom", "2023-10-26");
        todo.priority = Some(Priority::A);
        todo.project_name = Some("Family".into());
        todo.area_name = Some("phone".into());
        todo.metadata.insert("due".into(), MetaValue::from("2023-10-27"));
        todo.metadata.insert("est".into(), MetaValue::Number(2.0));
        assert_eq!(
            format_line(&todo),
            "(A) 2023-10-26 Call Mom +Family @phone due:2023-10-27 est:2"
        );
    }

    #[test]
    fn test_format_completed_suppresses_priority() {
        let mut todo = dated("Review PR", "2023-10-24");
        todo.priority = Some(Priority::B);
        todo.completed = true;
        todo.completion_date = parse_date_token("2023-10-25");
        assert_eq!(format_line(&todo), "x 2023-10-25 2023-10-24 Review PR");
    }

    #[test]
    fn test_format_completed_without_completion_date() {
        let mut todo = dated("Review PR", "2023-10-24");
        todo.completed = true;
        assert_eq!(format_line(&todo), "x Review PR");
    }

    #[test]
    fn test_format_due_date_without_annotation() {
        let mut todo = dated("Pay rent", "2024-03-01");
        todo.due_date = parse_date_token("2024-03-05");
        assert_eq!(format_line(&todo), "2024-03-01 Pay rent due:2024-03-05");
    }

    #[test]
    fn test_format_collapses_whitespace() {
        let todo = dated("  Water   the\tplants ", "2024-03-01");
        assert_eq!(format_line(&todo), "2024-03-01 Water the plants");
    }

    #[test]
    fn test_format_is_idempotent_through_parse() {
        let lines = [
            "(A) 2023-10-26 Call Mom @phone +Family due:2023-10-27",
            "x 2023-10-25 2023-10-24 Review PR +Work @computer",
            "x Review PR",
            "2024-01-01 2023-12-31 looks like a date",
            "2024-01-01 (C) not a priority here",
            "(D) 2024-01-01 a:1 b:two c:http://x",
        ];
        for line in lines {
            let once = format_line(&parse_line(line));
            let twice = format_line(&parse_line(&once));
            assert_eq!(once, twice, "not idempotent for {:?}", line);
        }
    }

    #[test]
    fn test_format_file() {
        let todos = vec![dated("One", "2024-03-01"), dated("Two", "2024-03-02")];
        assert_eq!(format_file(&todos), "2024-03-01 One\n2024-03-02 Two\n");
    }
}
