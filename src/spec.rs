//! Immutable request specifications.
//!
//! A [`RequestSpec`] describes one logical request without binding it to a
//! backend: method, path, version prefix, query parameters and JSON body
//! fields. Every builder method borrows the receiver and returns a new spec,
//! so a common prefix can be shared and branched freely:
//!
//! ```
//! use netspec::RequestSpec;
//!
//! let base = RequestSpec::get("articles").add_query("lang", Some("en"));
//! let page_one = base.add_query("page", Some(1));
//! let page_two = base.add_query("page", Some(2));
//!
//! assert_eq!(base.query_value("page"), None);
//! assert_eq!(page_one.query_value("page"), Some("1"));
//! assert_eq!(page_two.query_value("page"), Some("2"));
//! ```

use crate::{query::QueryValue, Error, Result};
use http::Method;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashMap;

/// The version segment applied to specs that do not choose one.
pub const DEFAULT_VERSION: &str = "v1";

/// An immutable description of a pending request.
///
/// The version segment defaults to [`DEFAULT_VERSION`]; the assembler turns
/// `path` into `/{version}/{path}`, or `/{path}` when the version is absent.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestSpec {
    method: Method,
    path: String,
    version: Option<String>,
    query: HashMap<String, String>,
    body: Option<Map<String, Value>>,
}

impl RequestSpec {
    /// Creates a spec with the given method and path and the default version.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            version: Some(DEFAULT_VERSION.to_string()),
            query: HashMap::new(),
            body: None,
        }
    }

    /// Creates a spec with explicit query parameters and body.
    ///
    /// Query entries whose value is `None` are skipped.
    ///
    /// # Examples
    ///
    /// ```
    /// use netspec::RequestSpec;
    /// use http::Method;
    /// use serde_json::json;
    ///
    /// let body = json!({ "title": "hello" }).as_object().cloned();
    /// let spec = RequestSpec::with_parts(
    ///     Method::POST,
    ///     "posts",
    ///     [("draft", Some("true")), ("tag", None)],
    ///     body,
    /// );
    ///
    /// assert_eq!(spec.query_value("draft"), Some("true"));
    /// assert_eq!(spec.query_value("tag"), None);
    /// assert_eq!(spec.body().unwrap()["title"], "hello");
    /// ```
    pub fn with_parts<K, V>(
        method: Method,
        path: impl Into<String>,
        query: impl IntoIterator<Item = (K, Option<V>)>,
        body: Option<Map<String, Value>>,
    ) -> Self
    where
        K: Into<String>,
        V: QueryValue,
    {
        let query = query
            .into_iter()
            .filter_map(|(k, v)| v.map(|v| (k.into(), v.url_query_value())))
            .collect();
        Self {
            query,
            body,
            ..Self::new(method, path)
        }
    }

    /// Creates a GET spec.
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    /// Creates a POST spec.
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    /// Creates a PUT spec.
    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    /// Creates a DELETE spec.
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Creates a PATCH spec.
    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    /// The HTTP method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The path, relative to the version segment.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The version segment, if any.
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// All query parameters.
    pub fn query(&self) -> &HashMap<String, String> {
        &self.query
    }

    /// The value of a single query parameter.
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query.get(key).map(String::as_str)
    }

    /// The JSON body fields, if any were added.
    pub fn body(&self) -> Option<&Map<String, Value>> {
        self.body.as_ref()
    }

    /// Returns a spec with the version segment replaced.
    ///
    /// `None` or an empty string drops the version prefix entirely.
    pub fn change_version<S: AsRef<str>>(&self, version: Option<S>) -> Self {
        let version = version
            .map(|v| v.as_ref().to_string())
            .filter(|v| !v.is_empty());
        Self {
            version,
            ..self.clone()
        }
    }

    /// Returns a spec without a version segment.
    pub fn without_version(&self) -> Self {
        self.change_version(None::<&str>)
    }

    /// Returns a spec with one query parameter set, or removed when `value`
    /// is `None`.
    pub fn add_query<V: QueryValue>(&self, key: impl Into<String>, value: Option<V>) -> Self {
        self.add_queries([(key, value)])
    }

    /// Returns a spec with several query parameters set or removed.
    ///
    /// Each `None` removes its key; every other entry overwrites.
    pub fn add_queries<K, V>(&self, queries: impl IntoIterator<Item = (K, Option<V>)>) -> Self
    where
        K: Into<String>,
        V: QueryValue,
    {
        let mut query = self.query.clone();
        for (key, value) in queries {
            let key = key.into();
            match value {
                Some(value) => {
                    query.insert(key, value.url_query_value());
                }
                None => {
                    query.remove(&key);
                }
            }
        }
        Self {
            query,
            ..self.clone()
        }
    }

    /// Returns a spec with the given fields merged into the body.
    ///
    /// Later writes win on key collision.
    pub fn add_body<K, V>(&self, fields: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        let mut body = self.body.clone().unwrap_or_default();
        for (key, value) in fields {
            body.insert(key.into(), value.into());
        }
        Self {
            body: Some(body),
            ..self.clone()
        }
    }

    /// Returns a spec with a serialized value merged into the body.
    ///
    /// Without `for_key` the value must serialize to a JSON object and its
    /// fields are merged at the top level; with `for_key` the serialized value
    /// is stored under that key.
    ///
    /// If the value cannot be serialized the spec is returned unchanged. Use
    /// [`try_add_typed_body`](Self::try_add_typed_body) to observe the failure.
    ///
    /// # Examples
    ///
    /// ```
    /// use netspec::RequestSpec;
    /// use serde::Serialize;
    ///
    /// #[derive(Serialize)]
    /// struct Profile { nickname: String }
    ///
    /// let profile = Profile { nickname: "kit".to_string() };
    /// let spec = RequestSpec::put("me")
    ///     .add_typed_body(&profile, None)
    ///     .add_typed_body(&profile, Some("previous"));
    ///
    /// let body = spec.body().unwrap();
    /// assert_eq!(body["nickname"], "kit");
    /// assert_eq!(body["previous"]["nickname"], "kit");
    /// ```
    pub fn add_typed_body<T: Serialize + ?Sized>(&self, value: &T, for_key: Option<&str>) -> Self {
        match self.try_add_typed_body(value, for_key) {
            Ok(spec) => spec,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    path = %self.path,
                    "Typed body skipped"
                );
                self.clone()
            }
        }
    }

    /// Fallible form of [`add_typed_body`](Self::add_typed_body).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transform`] if the value fails to serialize, or if it
    /// is not a JSON object and no `for_key` was given.
    pub fn try_add_typed_body<T: Serialize + ?Sized>(
        &self,
        value: &T,
        for_key: Option<&str>,
    ) -> Result<Self> {
        let value = serde_json::to_value(value).map_err(|e| Error::Transform(e.to_string()))?;
        match (for_key, value) {
            (Some(key), value) => Ok(self.add_body([(key, value)])),
            (None, Value::Object(fields)) => Ok(self.add_body(fields)),
            (None, other) => Err(Error::Transform(format!(
                "expected a JSON object body, got {}",
                json_kind(&other)
            ))),
        }
    }

    /// Returns a spec without the query parameters whose value is empty.
    pub fn remove_empty_query_parameters(&self) -> Self {
        let query = self
            .query
            .iter()
            .filter(|(_, v)| !v.is_empty())
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Self {
            query,
            ..self.clone()
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Conversion from a domain-level endpoint description into a [`RequestSpec`].
///
/// Applications typically describe their API as an enum and implement this
/// trait once; every [`Client`](crate::Client) entry point accepts it.
///
/// # Examples
///
/// ```
/// use netspec::{RequestSpec, ToRequestSpec};
///
/// enum Api {
///     User(u64),
///     Search { term: String },
/// }
///
/// impl ToRequestSpec for Api {
///     fn to_request_spec(&self) -> RequestSpec {
///         match self {
///             Api::User(id) => RequestSpec::get(format!("users/{id}")),
///             Api::Search { term } => RequestSpec::get("search").add_query("q", Some(term)),
///         }
///     }
/// }
///
/// assert_eq!(Api::User(7).to_request_spec().path(), "users/7");
/// ```
pub trait ToRequestSpec {
    /// Builds the spec describing this request.
    fn to_request_spec(&self) -> RequestSpec;
}

impl ToRequestSpec for RequestSpec {
    fn to_request_spec(&self) -> RequestSpec {
        self.clone()
    }
}

impl<T: ToRequestSpec + ?Sized> ToRequestSpec for &T {
    fn to_request_spec(&self) -> RequestSpec {
        (**self).to_request_spec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> RequestSpec {
        RequestSpec::get("users")
            .add_query("id", Some(7))
            .add_query("filter", Some(""))
            .add_body([("name", "ada")])
    }

    #[test]
    fn test_defaults() {
        let spec = RequestSpec::post("items");
        assert_eq!(spec.method(), &Method::POST);
        assert_eq!(spec.path(), "items");
        assert_eq!(spec.version(), Some(DEFAULT_VERSION));
        assert!(spec.query().is_empty());
        assert!(spec.body().is_none());
    }

    #[test]
    fn test_transformations_leave_receiver_untouched() {
        let original = sample();
        let snapshot = original.clone();

        let _ = original.add_query("page", Some(2));
        let _ = original.add_query("id", None::<i32>);
        let _ = original.add_queries([("a", Some("1")), ("b", Some("2"))]);
        let _ = original.add_body([("extra", true)]);
        let _ = original.add_typed_body(&json!({"k": "v"}), None);
        let _ = original.change_version(Some("v9"));
        let _ = original.without_version();
        let _ = original.remove_empty_query_parameters();

        assert_eq!(original, snapshot);
        assert_eq!(original.query_value("id"), Some("7"));
        assert_eq!(original.query_value("filter"), Some(""));
        assert_eq!(original.version(), Some("v1"));
    }

    #[test]
    fn test_add_query_none_removes() {
        let spec = sample().add_query("id", None::<i32>);
        assert_eq!(spec.query_value("id"), None);
        assert_eq!(spec.query_value("filter"), Some(""));
    }

    #[test]
    fn test_add_query_none_on_absent_key_is_noop() {
        let spec = sample();
        assert_eq!(spec.add_query("missing", None::<&str>), spec);
    }

    #[test]
    fn test_add_queries_mixed() {
        let spec = sample().add_queries([("id", None), ("page", Some("3")), ("filter", Some("x"))]);
        assert_eq!(spec.query_value("id"), None);
        assert_eq!(spec.query_value("page"), Some("3"));
        assert_eq!(spec.query_value("filter"), Some("x"));
    }

    #[test]
    fn test_add_queries_heterogeneous_values() {
        let values: [(&str, Option<&dyn QueryValue>); 3] = [
            ("limit", Some(&10 as &dyn QueryValue)),
            ("q", Some(&"rust" as &dyn QueryValue)),
            ("cursor", None),
        ];
        let spec = RequestSpec::get("search")
            .add_query("cursor", Some("abc"))
            .add_queries(values);
        assert_eq!(spec.query_value("limit"), Some("10"));
        assert_eq!(spec.query_value("q"), Some("rust"));
        assert_eq!(spec.query_value("cursor"), None);
    }

    #[test]
    fn test_change_version() {
        let spec = sample().change_version(Some("v2"));
        assert_eq!(spec.version(), Some("v2"));
        assert_eq!(spec.change_version(Some("")).version(), None);
        assert_eq!(spec.change_version(None::<String>).version(), None);
    }

    #[test]
    fn test_add_body_last_write_wins() {
        let spec = sample()
            .add_body([("name", json!("grace")), ("age", json!(36))])
            .add_body([("age", 37)]);
        let body = spec.body().unwrap();
        assert_eq!(body["name"], "grace");
        assert_eq!(body["age"], 37);
    }

    #[test]
    fn test_add_typed_body_flattens_objects() {
        #[derive(Serialize)]
        struct Login<'a> {
            user: &'a str,
            remember: bool,
        }

        let spec = RequestSpec::post("login").add_typed_body(
            &Login {
                user: "ada",
                remember: true,
            },
            None,
        );
        let body = spec.body().unwrap();
        assert_eq!(body["user"], "ada");
        assert_eq!(body["remember"], true);
    }

    #[test]
    fn test_add_typed_body_nests_under_key() {
        let spec = sample().add_typed_body(&vec![1, 2, 3], Some("ids"));
        let body = spec.body().unwrap();
        assert_eq!(body["ids"], json!([1, 2, 3]));
        assert_eq!(body["name"], "ada");
    }

    #[test]
    fn test_add_typed_body_non_object_is_noop() {
        let spec = sample();
        assert_eq!(spec.add_typed_body(&42, None), spec);
        assert!(matches!(
            spec.try_add_typed_body(&42, None),
            Err(Error::Transform(_))
        ));
    }

    #[test]
    fn test_add_typed_body_unserializable_is_noop() {
        let mut map = std::collections::BTreeMap::new();
        map.insert(vec![1u8], "non-string key");

        let spec = sample();
        assert_eq!(spec.add_typed_body(&map, None), spec);
        assert!(matches!(
            spec.try_add_typed_body(&map, Some("m")),
            Err(Error::Transform(_))
        ));
    }

    #[test]
    fn test_remove_empty_query_parameters_idempotent() {
        let once = sample().remove_empty_query_parameters();
        let twice = once.remove_empty_query_parameters();
        assert_eq!(once, twice);
        assert_eq!(once.query_value("filter"), None);
        assert_eq!(once.query_value("id"), Some("7"));
    }

    #[test]
    fn test_with_parts_skips_absent_query_values() {
        let spec = RequestSpec::with_parts(
            Method::DELETE,
            "sessions",
            [("all", Some(true)), ("force", None)],
            None,
        );
        assert_eq!(spec.version(), Some("v1"));
        assert_eq!(spec.query_value("all"), Some("true"));
        assert!(!spec.query().contains_key("force"));
    }

    #[test]
    fn test_to_request_spec_by_reference() {
        let spec = sample();
        assert_eq!((&spec).to_request_spec(), spec);
    }
}
