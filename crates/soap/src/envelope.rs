//! SOAP 1.1 envelope codec.
//!
//! Requests are written as document/literal envelopes with one element per
//! parameter. Responses are read by local name, so namespace prefixes chosen by
//! the server do not matter. Parameter values that carry XML documents arrive
//! escaped (or as CDATA) and are returned as plain text.

use std::collections::HashMap;

use quick_xml::escape::{escape, unescape};
use quick_xml::events::Event;
use quick_xml::Reader;
use session::RpcError;

/// SOAP 1.1 envelope namespace.
pub const ENVELOPE_NAMESPACE: &str = "http://schemas.xmlsoap.org/soap/envelope/";

/// Target namespace of a web service, e.g. `urn:trisoft-com:ISH.WS.Application25`.
pub fn service_namespace(service: &str) -> String {
    format!("urn:trisoft-com:ISH.WS.{service}")
}

/// `SOAPAction` header value for `operation`.
pub fn soap_action(namespace: &str, operation: &str) -> String {
    format!("\"{namespace}/{operation}\"")
}

/// One request parameter.
#[derive(Debug, Clone, Copy)]
pub enum Param<'a> {
    /// A text value.
    Text(&'a str),
    /// A string array, one `<string>` child per item.
    List(&'a [String]),
    /// Not sent.
    Absent,
}

/// Writes a request envelope.
pub fn build_request(namespace: &str, operation: &str, params: &[(&str, Param<'_>)]) -> String {
    let mut xml = format!(
        "<?xml version=\"1.0\" encoding=\"utf-8\"?><soap:Envelope xmlns:soap=\"{ENVELOPE_NAMESPACE}\"><soap:Body><{operation} xmlns=\"{}\">",
        escape(namespace)
    );
    for (name, param) in params {
        match param {
            Param::Text(value) => {
                xml.push_str(&format!("<{name}>{}</{name}>", escape(*value)));
            }
            Param::List(items) => {
                xml.push_str(&format!("<{name}>"));
                for item in items.iter() {
                    xml.push_str(&format!("<string>{}</string>", escape(item.as_str())));
                }
                xml.push_str(&format!("</{name}>"));
            }
            Param::Absent => {}
        }
    }
    xml.push_str(&format!("</{operation}></soap:Body></soap:Envelope>"));
    xml
}

/// Output parameters of one response, keyed by local element name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Response {
    values: HashMap<String, String>,
}

impl Response {
    /// Removes and returns a required output parameter.
    pub fn take(&mut self, name: &str) -> Result<String, RpcError> {
        self.values
            .remove(name)
            .ok_or_else(|| RpcError::malformed(format!("response lacks '{name}'")))
    }

    /// Removes and returns an optional output parameter; empty counts as absent.
    pub fn take_optional(&mut self, name: &str) -> Option<String> {
        self.values.remove(name).filter(|value| !value.is_empty())
    }
}

/// Reads the response envelope of `operation`.
///
/// A SOAP fault anywhere in the body becomes [`RpcError::Fault`]. A body
/// without `{operation}Response` is malformed.
pub fn parse_response(body: &str, operation: &str) -> Result<Response, RpcError> {
    let response_name = format!("{operation}Response");
    let malformed = |e: quick_xml::Error| RpcError::malformed(format!("unreadable envelope: {e}"));

    let mut reader = Reader::from_str(body);
    let mut values = HashMap::new();
    let mut found = false;
    let mut in_response = false;
    let mut in_fault = false;
    let mut fault_code = String::new();
    let mut fault_message = String::new();

    loop {
        match reader.read_event().map_err(malformed)? {
            Event::Start(element) => {
                let local = element.local_name();
                let name = local.as_ref();
                if in_response {
                    let key = String::from_utf8_lossy(name).into_owned();
                    let span = reader.read_to_end(element.name()).map_err(malformed)?;
                    values.insert(key, inner_text(body, span.start, span.end)?);
                } else if in_fault && (name == b"faultcode" || name == b"faultstring") {
                    let is_code = name == b"faultcode";
                    let span = reader.read_to_end(element.name()).map_err(malformed)?;
                    let text = inner_text(body, span.start, span.end)?;
                    if is_code {
                        fault_code = text;
                    } else {
                        fault_message = text;
                    }
                } else if name == b"Fault" {
                    in_fault = true;
                } else if name == response_name.as_bytes() {
                    found = true;
                    in_response = true;
                }
            }
            Event::Empty(element) => {
                let local = element.local_name();
                let name = local.as_ref();
                if in_response {
                    values.insert(String::from_utf8_lossy(name).into_owned(), String::new());
                } else if name == response_name.as_bytes() {
                    found = true;
                }
            }
            Event::End(element) => {
                let local = element.local_name();
                let name = local.as_ref();
                if name == response_name.as_bytes() {
                    in_response = false;
                } else if name == b"Fault" {
                    return Err(RpcError::Fault {
                        code: fault_code,
                        message: fault_message,
                    });
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !found {
        return Err(RpcError::malformed(format!("envelope lacks '{response_name}'")));
    }
    Ok(Response { values })
}

/// Text content between two byte offsets: CDATA is taken literally, anything
/// else is unescaped.
fn inner_text(body: &str, start: u64, end: u64) -> Result<String, RpcError> {
    let raw = usize::try_from(start)
        .ok()
        .zip(usize::try_from(end).ok())
        .and_then(|(start, end)| body.get(start..end))
        .ok_or_else(|| RpcError::malformed("element content out of range"))?;

    let trimmed = raw.trim();
    if let Some(cdata) = trimmed
        .strip_prefix("<![CDATA[")
        .and_then(|rest| rest.strip_suffix("]]>"))
    {
        return Ok(cdata.to_owned());
    }
    unescape(raw)
        .map(|text| text.into_owned())
        .map_err(|e| RpcError::malformed(format!("invalid escape in element content: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_escapes_values_and_omits_absent_params() {
        let types = vec!["ISHModule".to_owned(), "ISHPublication".to_owned()];
        let xml = build_request(
            "urn:trisoft-com:ISH.WS.Settings25",
            "RetrieveFieldSetupByIshType",
            &[
                ("psAuthContext", Param::Text("a<b")),
                ("pasIshTypes", Param::List(&types)),
                ("psNothing", Param::Absent),
            ],
        );
        assert!(xml.contains(
            "<RetrieveFieldSetupByIshType xmlns=\"urn:trisoft-com:ISH.WS.Settings25\"><psAuthContext>a&lt;b</psAuthContext>"
        ));
        assert!(xml.contains("<pasIshTypes><string>ISHModule</string><string>ISHPublication</string></pasIshTypes>"));
        assert!(!xml.contains("psNothing"));
        assert!(xml.ends_with("</RetrieveFieldSetupByIshType></soap:Body></soap:Envelope>"));
    }

    #[test]
    fn action_header_is_quoted_namespace_and_operation() {
        assert_eq!(
            soap_action(&service_namespace("Application25"), "Login"),
            "\"urn:trisoft-com:ISH.WS.Application25/Login\""
        );
    }

    #[test]
    fn response_values_are_unescaped_by_local_name() {
        let body = r#"<?xml version="1.0" encoding="utf-8"?>
<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/">
  <soap:Body>
    <GetMetaDataResponse xmlns="urn:trisoft-com:ISH.WS.Settings25">
      <psAuthContext>tok-2</psAuthContext>
      <psOutXMLObjList>&lt;ishobjects&gt;&lt;ishobject/&gt;&lt;/ishobjects&gt;</psOutXMLObjList>
      <psEmpty/>
    </GetMetaDataResponse>
  </soap:Body>
</soap:Envelope>"#;
        let mut response = parse_response(body, "GetMetaData").unwrap();
        assert_eq!(response.take("psAuthContext").unwrap(), "tok-2");
        assert_eq!(
            response.take("psOutXMLObjList").unwrap(),
            "<ishobjects><ishobject/></ishobjects>"
        );
        assert_eq!(response.take_optional("psEmpty"), None);
        assert!(response.take("psMissing").is_err());
    }

    #[test]
    fn cdata_content_is_taken_literally() {
        let body = "<s:Envelope xmlns:s=\"http://schemas.xmlsoap.org/soap/envelope/\"><s:Body><GetVersionResponse><GetVersionResult><![CDATA[15.0.0.1234]]></GetVersionResult></GetVersionResponse></s:Body></s:Envelope>";
        let mut response = parse_response(body, "GetVersion").unwrap();
        assert_eq!(response.take("GetVersionResult").unwrap(), "15.0.0.1234");
    }

    #[test]
    fn fault_becomes_rpc_fault() {
        let body = r#"<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/"><soap:Body><soap:Fault><faultcode>soap:Server</faultcode><faultstring>[-105] The user name or password is incorrect</faultstring></soap:Fault></soap:Body></soap:Envelope>"#;
        match parse_response(body, "Login").unwrap_err() {
            RpcError::Fault { code, message } => {
                assert_eq!(code, "soap:Server");
                assert!(message.contains("-105"));
            }
            other => panic!("expected fault, got {other:?}"),
        }
    }

    #[test]
    fn missing_response_element_is_malformed() {
        let body = "<soap:Envelope xmlns:soap=\"x\"><soap:Body><OtherResponse/></soap:Body></soap:Envelope>";
        assert!(matches!(
            parse_response(body, "Login"),
            Err(RpcError::MalformedResponse { .. })
        ));
        assert!(matches!(
            parse_response("<html>", "Login"),
            Err(RpcError::MalformedResponse { .. })
        ));
    }
}
