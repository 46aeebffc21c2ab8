use reqwest::Url;

use crate::error::ClientError;

/// Append `segments` to the path of `base`, percent-encoding each one so ids
/// containing `#`, `?`, `%` or spaces stay inside their own segment.
pub(crate) fn join_segments<I>(base: &str, segments: I) -> Result<Url, ClientError>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let mut url = Url::parse(base)
        .map_err(|err| ClientError::invalid_path(base, format!("invalid base URL: {err}")))?;

    url.path_segments_mut()
        .map_err(|()| ClientError::invalid_path(base, "base URL cannot carry a path"))?
        .pop_if_empty()
        .extend(segments);

    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_reserved_characters_per_segment() {
        let url = join_segments("http://localhost:9000/v1", ["notes", "a#b", "what?now", "50% off"])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:9000/v1/notes/a%23b/what%3Fnow/50%25%20off"
        );
        assert_eq!(url.query(), None);
        assert_eq!(url.fragment(), None);
    }

    #[test]
    fn trailing_slash_on_base_is_not_doubled() {
        let url = join_segments("https://proj1.firebaseio.com/", [".json"]).unwrap();
        assert_eq!(url.as_str(), "https://proj1.firebaseio.com/.json");
    }

    #[test]
    fn rejects_unparseable_base() {
        let err = join_segments("not a url", ["x"]).unwrap_err();
        assert!(matches!(err, ClientError::InvalidPath { .. }));
    }
}
