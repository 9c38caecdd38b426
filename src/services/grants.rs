//! Per-student allow-lists of videos and exams.

/// Collapses repeated ids while keeping the first occurrence of each in place.
pub(crate) fn normalize(ids: &[String]) -> Vec<String> {
    let mut output: Vec<String> = Vec::with_capacity(ids.len());
    for id in ids {
        let id = id.trim();
        if id.is_empty() || output.iter().any(|existing| existing == id) {
            continue;
        }
        output.push(id.to_string());
    }
    output
}

/// Requested ids that are absent from `existing`, in request order.
pub(crate) fn missing<'a>(requested: &'a [String], existing: &[String]) -> Vec<&'a str> {
    requested
        .iter()
        .filter(|id| !existing.contains(id))
        .map(String::as_str)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn normalize_dedups_and_keeps_order() {
        assert_eq!(normalize(&ids(&["v2", "v1", "v2", " ", "v3", "v1"])), ids(&["v2", "v1", "v3"]));
    }

    #[test]
    fn missing_reports_unknown_ids() {
        let requested = ids(&["e1", "e2", "e3"]);
        let existing = ids(&["e3", "e1"]);
        assert_eq!(missing(&requested, &existing), vec!["e2"]);
        assert!(missing(&requested, &ids(&["e1", "e2", "e3"])).is_empty());
    }
}
