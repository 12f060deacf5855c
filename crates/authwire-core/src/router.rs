//! Declarative endpoint descriptors.
//!
//! A [`Router`] describes one API endpoint: where it lives, how it is called,
//! and which credential it needs. [`Router::to_request`] turns a descriptor
//! into an [`HttpRequest`] that the pipeline signs and sends.

use url::Url;

use crate::Result;
use crate::error::InvalidInputError;
use crate::types::{AuthorizationRequirement, Headers, HttpRequest, Method};

/// Body of a request built from a [`Router`].
#[derive(Debug, Clone, PartialEq, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    /// Serialized as JSON with `Content-Type: application/json`.
    Json(serde_json::Value),
    /// Encoded as `application/x-www-form-urlencoded`.
    Form(Vec<(String, String)>),
    /// Sent as-is with the given content type.
    Raw {
        content_type: String,
        bytes: Vec<u8>,
    },
}

impl RequestBody {
    /// Serialize any value as a JSON body.
    pub fn json<T: serde::Serialize>(value: &T) -> Result<Self> {
        serde_json::to_value(value)
            .map(RequestBody::Json)
            .map_err(|err| {
                InvalidInputError::Body {
                    reason: err.to_string(),
                }
                .into()
            })
    }

    /// Encode the body and return `(content_type, bytes)`.
    fn encode(&self) -> Result<Option<(String, Vec<u8>)>> {
        match self {
            RequestBody::Empty => Ok(None),
            RequestBody::Json(value) => {
                let bytes = serde_json::to_vec(value).map_err(|err| InvalidInputError::Body {
                    reason: err.to_string(),
                })?;
                Ok(Some(("application/json".to_string(), bytes)))
            }
            RequestBody::Form(pairs) => {
                let encoded = url::form_urlencoded::Serializer::new(String::new())
                    .extend_pairs(pairs.iter())
                    .finish();
                Ok(Some((
                    "application/x-www-form-urlencoded".to_string(),
                    encoded.into_bytes(),
                )))
            }
            RequestBody::Raw {
                content_type,
                bytes,
            } => Ok(Some((content_type.clone(), bytes.clone()))),
        }
    }
}

/// An API endpoint definition.
pub trait Router: Send + Sync {
    /// Scheme, host and optional base path, e.g. `https://api.example.com/v1`.
    fn base_url(&self) -> &str;

    /// Path relative to the base URL.
    fn path(&self) -> String;

    fn method(&self) -> Method {
        Method::Get
    }

    fn headers(&self) -> Headers {
        Headers::new()
    }

    fn query(&self) -> Vec<(String, String)> {
        Vec::new()
    }

    fn body(&self) -> Result<RequestBody> {
        Ok(RequestBody::Empty)
    }

    /// The credential this endpoint requires.
    fn authorization(&self) -> AuthorizationRequirement;

    /// Build the transport request for this endpoint.
    fn to_request(&self) -> Result<HttpRequest> {
        let raw = format!(
            "{}/{}",
            self.base_url().trim_end_matches('/'),
            self.path().trim_start_matches('/')
        );
        let mut url = Url::parse(&raw).map_err(|err| InvalidInputError::Url {
            value: raw.clone(),
            reason: err.to_string(),
        })?;

        let query = self.query();
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query.iter());
        }

        let mut request = HttpRequest::new(self.method(), url);
        for (name, value) in self.headers().iter() {
            request.headers.append(name, value);
        }

        if let Some((content_type, bytes)) = self.body()?.encode()? {
            if !request.headers.contains("Content-Type") {
                request.headers.insert("Content-Type", content_type);
            }
            request.body = Some(bytes);
        }

        Ok(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Search {
        term: &'static str,
    }

    impl Router for Search {
        fn base_url(&self) -> &str {
            "https://api.example.com/v1/"
        }

        fn path(&self) -> String {
            "/search".to_string()
        }

        fn query(&self) -> Vec<(String, String)> {
            vec![("q".to_string(), self.term.to_string())]
        }

        fn authorization(&self) -> AuthorizationRequirement {
            AuthorizationRequirement::ACCESS_TOKEN
        }
    }

    struct CreateNote;

    impl Router for CreateNote {
        fn base_url(&self) -> &str {
            "https://api.example.com"
        }

        fn path(&self) -> String {
            "notes".to_string()
        }

        fn method(&self) -> Method {
            Method::Post
        }

        fn body(&self) -> Result<RequestBody> {
            RequestBody::json(&json!({"text": "hello"}))
        }

        fn authorization(&self) -> AuthorizationRequirement {
            AuthorizationRequirement::None
        }
    }

    #[test]
    fn joins_base_path_and_query() {
        let request = Search { term: "a b&c" }.to_request().unwrap();
        assert_eq!(request.method, Method::Get);
        assert_eq!(
            request.url.as_str(),
            "https://api.example.com/v1/search?q=a+b%26c"
        );
        assert!(request.body.is_none());
        assert!(request.authorization().is_none());
    }

    #[test]
    fn json_body_sets_content_type() {
        let request = CreateNote.to_request().unwrap();
        assert_eq!(request.url.as_str(), "https://api.example.com/notes");
        assert_eq!(
            request.headers.get("content-type"),
            Some("application/json")
        );
        let body: serde_json::Value = serde_json::from_slice(&request.body.unwrap()).unwrap();
        assert_eq!(body, json!({"text": "hello"}));
    }

    #[test]
    fn form_body_is_urlencoded() {
        let body = RequestBody::Form(vec![
            ("grant_type".to_string(), "refresh_token".to_string()),
            ("scope".to_string(), "read write".to_string()),
        ]);
        let (content_type, bytes) = body.encode().unwrap().unwrap();
        assert_eq!(content_type, "application/x-www-form-urlencoded");
        assert_eq!(bytes, b"grant_type=refresh_token&scope=read+write");
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        struct Broken;
        impl Router for Broken {
            fn base_url(&self) -> &str {
                "not a url"
            }
            fn path(&self) -> String {
                "x".to_string()
            }
            fn authorization(&self) -> AuthorizationRequirement {
                AuthorizationRequirement::None
            }
        }

        let err = Broken.to_request().unwrap_err();
        assert!(matches!(
            err,
            crate::Error::InvalidInput(InvalidInputError::Url { .. })
        ));
    }
}
