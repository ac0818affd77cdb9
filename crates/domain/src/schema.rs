//! Declarative schema of the `fastly_tls_subscription` resource

use serde::Serialize;

use crate::model::CertificateAuthority;

/// Resource type name as exposed to configuration
pub const RESOURCE_TYPE: &str = "fastly_tls_subscription";

/// Value type of an attribute
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum AttributeType {
    String,
    Bool,
    /// Set of primitive strings
    StringSet,
    /// Map of string to string
    StringMap,
    /// Set of nested objects
    ObjectSet { attributes: Vec<Attribute> },
}

/// A single attribute of the resource schema
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Attribute {
    pub name: &'static str,
    #[serde(rename = "type")]
    pub attribute_type: AttributeType,
    pub description: &'static str,
    pub required: bool,
    pub optional: bool,
    pub computed: bool,
    pub force_new: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_items: Option<usize>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub allowed_values: Vec<&'static str>,
}

impl Attribute {
    fn new(name: &'static str, attribute_type: AttributeType, description: &'static str) -> Self {
        Self {
            name,
            attribute_type,
            description,
            required: false,
            optional: false,
            computed: false,
            force_new: false,
            default: None,
            deprecated: None,
            min_items: None,
            allowed_values: vec![],
        }
    }

    pub fn required(name: &'static str, t: AttributeType, description: &'static str) -> Self {
        Self {
            required: true,
            ..Self::new(name, t, description)
        }
    }

    pub fn optional(name: &'static str, t: AttributeType, description: &'static str) -> Self {
        Self {
            optional: true,
            ..Self::new(name, t, description)
        }
    }

    pub fn computed(name: &'static str, t: AttributeType, description: &'static str) -> Self {
        Self {
            computed: true,
            ..Self::new(name, t, description)
        }
    }

    /// Optional in configuration, filled in by the API when omitted
    pub fn optional_computed(
        name: &'static str,
        t: AttributeType,
        description: &'static str,
    ) -> Self {
        Self {
            optional: true,
            computed: true,
            ..Self::new(name, t, description)
        }
    }

    pub fn with_force_new(mut self) -> Self {
        self.force_new = true;
        self
    }

    pub fn with_default(mut self, value: serde_json::Value) -> Self {
        self.default = Some(value);
        self
    }

    pub fn with_deprecation(mut self, message: &'static str) -> Self {
        self.deprecated = Some(message);
        self
    }

    pub fn with_min_items(mut self, min: usize) -> Self {
        self.min_items = Some(min);
        self
    }

    pub fn with_allowed_values(mut self, values: Vec<&'static str>) -> Self {
        self.allowed_values = values;
        self
    }
}

/// Full schema of a resource type
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceSchema {
    pub type_name: &'static str,
    pub version: u32,
    /// Whether `import <id>` is supported
    pub importable: bool,
    pub attributes: Vec<Attribute>,
}

impl ResourceSchema {
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Names of attributes that always force replacement when changed
    pub fn force_new_attributes(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.attributes
            .iter()
            .filter(|a| a.force_new)
            .map(|a| a.name)
    }

    /// Schema of the TLS subscription resource
    pub fn tls_subscription() -> Self {
        let dns_challenge = vec![
            Attribute::computed(
                "record_name",
                AttributeType::String,
                "The name of the DNS record to add. For example `_acme-challenge.example.com`.",
            ),
            Attribute::computed(
                "record_type",
                AttributeType::String,
                "The type of DNS record to add, e.g. `A`, or `CNAME`.",
            ),
            Attribute::computed(
                "record_value",
                AttributeType::String,
                "The value to which the DNS record should point, e.g. `xxxxx.fastly-validations.com`.",
            ),
        ];

        let http_challenge = vec![
            Attribute::computed(
                "record_name",
                AttributeType::String,
                "The name of the DNS record to add. For example `example.com`.",
            ),
            Attribute::computed(
                "record_type",
                AttributeType::String,
                "The type of DNS record to add, e.g. `A`, or `CNAME`.",
            ),
            Attribute::computed(
                "record_values",
                AttributeType::StringSet,
                "A list with the value(s) to which the DNS record should point.",
            ),
        ];

        Self {
            type_name: RESOURCE_TYPE,
            version: 0,
            importable: true,
            attributes: vec![
                Attribute::required(
                    "certificate_authority",
                    AttributeType::String,
                    "The entity that issues and certifies the TLS certificates for your subscription.",
                )
                .with_force_new()
                .with_allowed_values(
                    CertificateAuthority::ALL.iter().map(|ca| ca.as_str()).collect(),
                ),
                Attribute::computed(
                    "certificate_id",
                    AttributeType::String,
                    "The certificate ID associated with the subscription.",
                ),
                Attribute::optional_computed(
                    "common_name",
                    AttributeType::String,
                    "The common name associated with the subscription. Defaults to the first TLS domain; if provided it must be included in `domains`.",
                ),
                Attribute::optional_computed(
                    "configuration_id",
                    AttributeType::String,
                    "The ID of the set of TLS configuration options that apply to the enabled domains on this subscription.",
                ),
                Attribute::computed(
                    "created_at",
                    AttributeType::String,
                    "Timestamp (GMT) when the subscription was created.",
                ),
                Attribute::required(
                    "domains",
                    AttributeType::StringSet,
                    "List of domains on which to enable TLS.",
                )
                .with_min_items(1),
                Attribute::optional(
                    "force_destroy",
                    AttributeType::Bool,
                    "Force delete the subscription even if it has active domains. This can disable production traffic if used incorrectly.",
                )
                .with_default(serde_json::Value::Bool(false)),
                Attribute::optional(
                    "force_update",
                    AttributeType::Bool,
                    "Force update the subscription even if it has active domains. This can disable production traffic if used incorrectly.",
                )
                .with_default(serde_json::Value::Bool(false)),
                Attribute::computed(
                    "managed_dns_challenge",
                    AttributeType::StringMap,
                    "The details required to configure DNS to respond to ACME DNS challenge in order to verify domain ownership.",
                )
                .with_deprecation("Use 'managed_dns_challenges' attribute instead"),
                Attribute::computed(
                    "managed_dns_challenges",
                    AttributeType::ObjectSet {
                        attributes: dns_challenge,
                    },
                    "A list of options for configuring DNS to respond to ACME DNS challenge in order to verify domain ownership.",
                ),
                Attribute::computed(
                    "managed_http_challenges",
                    AttributeType::ObjectSet {
                        attributes: http_challenge,
                    },
                    "A list of options for configuring DNS to respond to ACME HTTP challenge in order to verify domain ownership.",
                ),
                Attribute::computed(
                    "state",
                    AttributeType::String,
                    "The current state of the subscription: `pending`, `processing`, `issued`, or `renewing`.",
                ),
                Attribute::computed(
                    "updated_at",
                    AttributeType::String,
                    "Timestamp (GMT) when the subscription was updated.",
                ),
            ],
        }
    }
}
