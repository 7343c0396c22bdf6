use std::future::Future;

/// Result of trying one candidate in a fallback chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attempt<T> {
    Found(T),
    /// Nothing here, move on to the next candidate.
    Miss,
    /// Abandon the remaining candidates.
    Stop,
}

/// Try candidates in order until one produces a value.
///
/// Candidates after the first `Found` or `Stop` are never attempted.
pub async fn first_found<C, T, F, Fut>(
    candidates: impl IntoIterator<Item = C>,
    mut attempt: F,
) -> Option<T>
where
    F: FnMut(C) -> Fut,
    Fut: Future<Output = Attempt<T>>,
{
    for candidate in candidates {
        match attempt(candidate).await {
            Attempt::Found(value) => return Some(value),
            Attempt::Miss => {}
            Attempt::Stop => return None,
        }
    }
    None
}
