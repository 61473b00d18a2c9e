/// Read-through caching for catalog lookups.
///
/// Returns the cached value for `$key` when present. Otherwise awaits
/// `$block`, hands the result to the cache writer with `$ttl` and returns it.
/// Errors from `$block` propagate and nothing is cached.
///
/// # Arguments
/// * `$cache`: anything with `get_from_cache` and `set_in_background`.
/// * `$key`: the `CacheKey` to read and write.
/// * `$ttl`: a `Duration` the entry stays valid for.
/// * `$block`: the future computing the value on a miss.
///
/// # Example
/// ```rust,ignore
/// let rows = cached!(cache, CacheKey::Category("trending".into()), ttl, async move {
///     fetch_rows().await
/// });
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $ttl:expr, $block:expr) => {{
        if let Some(cached) = $cache.get_from_cache(&$key).await? {
            Ok(cached)
        } else {
            let value = $block.await?;
            $cache.set_in_background(&$key, &value, $ttl);
            Ok(value)
        }
    }};
}
