use serde::Serialize;

pub(crate) const fn default_limit() -> i64 {
    100
}

/// Clamps client-supplied paging to `skip >= 0` and `1 <= limit <= 1000`.
pub(crate) fn normalize(skip: i64, limit: i64) -> (i64, i64) {
    (skip.max(0), limit.clamp(1, 1000))
}

#[derive(Debug, Serialize)]
pub(crate) struct PaginatedResponse<T> {
    pub(crate) items: Vec<T>,
    pub(crate) total_count: i64,
    pub(crate) skip: i64,
    pub(crate) limit: i64,
}

#[cfg(test)]
mod tests {
    use super::normalize;

    #[test]
    fn normalize_clamps_both_ends() {
        assert_eq!(normalize(-5, 0), (0, 1));
        assert_eq!(normalize(10, 5000), (10, 1000));
        assert_eq!(normalize(0, 50), (0, 50));
    }
}
