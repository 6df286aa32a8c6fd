//! Wire envelope for the document-creation endpoint.
//!
//! The endpoint accepts a fixed JSON object wrapping the serialized business
//! document together with its detached signature.

use serde::Serialize;
use serde_json::Value;

use crate::error::Result;

/// Format marker for manually submitted documents.
pub const DOCUMENT_FORMAT: &str = "MANUAL";

/// Document type marker for goods introduction.
pub const DOCUMENT_TYPE: &str = "LP_INTRODUCE_GOODS";

/// Product group identifier carried in the envelope body.
pub const PRODUCT_GROUP: u32 = 1;

#[derive(Debug, Serialize)]
struct Envelope<'a> {
    document_format: &'static str,
    product_document: Value,
    product_group: u32,
    signature: &'a str,
    #[serde(rename = "type")]
    doc_type: &'static str,
}

/// Render a document and its signature into the wire envelope.
pub fn render<D: Serialize>(payload: &D, signature: &str) -> Result<Vec<u8>> {
    let product_document = serde_json::to_value(payload)?;
    let envelope = Envelope {
        document_format: DOCUMENT_FORMAT,
        product_document,
        product_group: PRODUCT_GROUP,
        signature,
        doc_type: DOCUMENT_TYPE,
    };
    Ok(serde_json::to_vec(&envelope)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;

    #[test]
    fn test_envelope_has_exact_field_set() {
        let document = Document {
            doc_id: Some("doc-1".to_string()),
            ..Document::default()
        };

        let bytes = render(&document, "c2lnbmF0dXJl").unwrap();
        let value: Value = serde_json::from_slice(&bytes).unwrap();

        let object = value.as_object().unwrap();
        assert_eq!(object.len(), 5);
        assert_eq!(value["document_format"], "MANUAL");
        assert_eq!(value["product_group"], 1);
        assert_eq!(value["signature"], "c2lnbmF0dXJl");
        assert_eq!(value["type"], "LP_INTRODUCE_GOODS");
        assert_eq!(value["product_document"]["doc_id"], "doc-1");
    }

    #[test]
    fn test_document_nested_as_json_object() {
        let document = Document::default();
        let bytes = render(&document, "sig").unwrap();
        let value: Value = serde_json::from_slice(&bytes).unwrap();

        // The document is embedded as a JSON object, not a quoted string.
        assert!(value["product_document"].is_object());
    }

    #[test]
    fn test_render_surfaces_serialize_errors() {
        struct Broken;

        impl Serialize for Broken {
            fn serialize<S: serde::Serializer>(
                &self,
                _serializer: S,
            ) -> std::result::Result<S::Ok, S::Error> {
                Err(serde::ser::Error::custom("malformed document"))
            }
        }

        assert!(render(&Broken, "sig").is_err());
    }
}
