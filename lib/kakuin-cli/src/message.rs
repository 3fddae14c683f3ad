use crate::args::MessageArgs;
use http::{HeaderMap, HeaderName, HeaderValue, Method};
use kakuin::config::Properties;
use miette::{miette, IntoDiagnostic};

pub struct Message {
    pub properties: Properties,
    pub method: Method,
    pub path: String,
    pub headers: HeaderMap,
}

impl Message {
    pub fn from_args(args: MessageArgs) -> miette::Result<Self> {
        let properties = Properties::load(&args.config)?;
        let method = Method::from_bytes(args.method.to_uppercase().as_bytes()).into_diagnostic()?;

        let mut headers = HeaderMap::new();
        for header in &args.headers {
            let (name, value) = header
                .split_once(':')
                .ok_or_else(|| miette!("Header `{header}` isn't in the form `Name: value`"))?;

            let name = HeaderName::from_bytes(name.trim().as_bytes()).into_diagnostic()?;
            let value = HeaderValue::from_str(value.trim()).into_diagnostic()?;
            headers.append(name, value);
        }

        Ok(Self {
            properties,
            method,
            path: args.path,
            headers,
        })
    }
}
