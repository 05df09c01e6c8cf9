//! Descriptor table of the mutable auth method fields.
//!
//! Update diffing walks this table instead of special-casing every field:
//! each descriptor knows which variant it belongs to, how to read the field
//! from a record and how two values are compared.

use crate::codec::normalize_list;
use crate::options::{AuthMethodOption, Field, FieldValue};
use crate::types::{AuthMethodRecord, MethodType};

/// How two values of a field are compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    /// Values must be identical.
    Exact,
    /// Lists compared as sets of trimmed strings.
    TrimmedSet,
}

/// Describes one mutable field.
#[derive(Debug, Clone, Copy)]
pub struct FieldDescriptor {
    pub field: Field,
    /// `None` for fields shared by every type.
    pub applies_to: Option<MethodType>,
    pub comparison: Comparison,
    pub get: fn(&AuthMethodRecord) -> Option<FieldValue>,
}

impl FieldDescriptor {
    /// Returns the configuration key of the field.
    #[must_use]
    pub fn key(&self) -> &'static str {
        self.field.key()
    }

    /// Returns `true` if the field exists for the given type.
    #[must_use]
    pub fn applies(&self, method_type: MethodType) -> bool {
        self.applies_to.is_none_or(|t| t == method_type)
    }

    /// Compares the field on two records.
    #[must_use]
    pub fn differs(&self, a: &AuthMethodRecord, b: &AuthMethodRecord) -> bool {
        let (a, b) = ((self.get)(a), (self.get)(b));
        match self.comparison {
            Comparison::Exact => a != b,
            Comparison::TrimmedSet => canonical_set(a) != canonical_set(b),
        }
    }

    /// Builds the reset-to-default option.
    #[must_use]
    pub fn default_option(&self) -> AuthMethodOption {
        AuthMethodOption::Default(self.field)
    }

    /// Builds the set option for the field's value on `record`, if it has one.
    /// Certificate lists are trimmed like the codec does on create.
    #[must_use]
    pub fn set_option(&self, record: &AuthMethodRecord) -> Option<AuthMethodOption> {
        let value = match ((self.get)(record)?, self.field) {
            (FieldValue::List(items), Field::OidcCaCertificates) => {
                FieldValue::List(normalize_list(&items))
            }
            (value, _) => value,
        };
        Some(AuthMethodOption::set(self.field, value))
    }
}

fn canonical_set(value: Option<FieldValue>) -> Option<Vec<String>> {
    match value? {
        FieldValue::List(items) => {
            let mut items = normalize_list(&items);
            items.sort();
            items.dedup();
            Some(items)
        }
        other => Some(vec![format!("{other:?}")]),
    }
}

fn str_value(value: Option<&String>) -> Option<FieldValue> {
    value.map(|s| FieldValue::Str(s.clone()))
}

fn list_value(value: Option<&Vec<String>>) -> Option<FieldValue> {
    value.map(|items| FieldValue::List(items.clone()))
}

const fn common(field: Field, get: fn(&AuthMethodRecord) -> Option<FieldValue>) -> FieldDescriptor {
    FieldDescriptor {
        field,
        applies_to: None,
        comparison: Comparison::Exact,
        get,
    }
}

const fn password(
    field: Field,
    get: fn(&AuthMethodRecord) -> Option<FieldValue>,
) -> FieldDescriptor {
    FieldDescriptor {
        field,
        applies_to: Some(MethodType::Password),
        comparison: Comparison::Exact,
        get,
    }
}

const fn oidc(
    field: Field,
    comparison: Comparison,
    get: fn(&AuthMethodRecord) -> Option<FieldValue>,
) -> FieldDescriptor {
    FieldDescriptor {
        field,
        applies_to: Some(MethodType::Oidc),
        comparison,
        get,
    }
}

/// Every mutable field, in the order options are emitted.
pub static FIELD_DESCRIPTORS: &[FieldDescriptor] = &[
    common(Field::Name, |r| str_value(r.name.as_ref())),
    common(Field::Description, |r| str_value(r.description.as_ref())),
    password(Field::MinLoginNameLength, |r| {
        r.password()?.min_login_name_length.map(FieldValue::Uint)
    }),
    password(Field::MinPasswordLength, |r| {
        r.password()?.min_password_length.map(FieldValue::Uint)
    }),
    oidc(Field::OidcIssuer, Comparison::Exact, |r| {
        str_value(r.oidc()?.issuer.as_ref())
    }),
    oidc(Field::OidcClientId, Comparison::Exact, |r| {
        str_value(r.oidc()?.client_id.as_ref())
    }),
    oidc(Field::OidcClientSecret, Comparison::Exact, |r| {
        str_value(r.oidc()?.client_secret.as_ref())
    }),
    oidc(Field::OidcMaxAge, Comparison::Exact, |r| {
        r.oidc()?.max_age.map(FieldValue::Uint)
    }),
    oidc(Field::OidcSigningAlgorithms, Comparison::Exact, |r| {
        list_value(r.oidc()?.signing_algorithms.as_ref())
    }),
    oidc(Field::OidcApiUrlPrefix, Comparison::Exact, |r| {
        str_value(r.oidc()?.api_url_prefix.as_ref())
    }),
    oidc(Field::OidcCaCertificates, Comparison::TrimmedSet, |r| {
        list_value(r.oidc()?.ca_certificates.as_ref())
    }),
    oidc(Field::OidcAllowedAudiences, Comparison::TrimmedSet, |r| {
        list_value(r.oidc()?.allowed_audiences.as_ref())
    }),
    oidc(Field::OidcDisableDiscoveredConfigValidation, Comparison::Exact, |r| {
        r.oidc()?.disable_discovered_config_validation.map(FieldValue::Bool)
    }),
];

/// Returns the descriptors that apply to the given type.
pub fn descriptors_for(method_type: MethodType) -> impl Iterator<Item = &'static FieldDescriptor> {
    FIELD_DESCRIPTORS
        .iter()
        .filter(move |d| d.applies(method_type))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AuthMethodAttributes, OidcAttributes};

    fn oidc_record(oidc: OidcAttributes) -> AuthMethodRecord {
        AuthMethodRecord::new("global", AuthMethodAttributes::Oidc(oidc))
    }

    fn descriptor(field: Field) -> &'static FieldDescriptor {
        FIELD_DESCRIPTORS.iter().find(|d| d.field == field).unwrap()
    }

    #[test]
    fn test_descriptors_per_type() {
        let password: Vec<Field> = descriptors_for(MethodType::Password).map(|d| d.field).collect();
        assert_eq!(
            password,
            vec![
                Field::Name,
                Field::Description,
                Field::MinLoginNameLength,
                Field::MinPasswordLength
            ]
        );
        assert_eq!(descriptors_for(MethodType::Oidc).count(), 11);
    }

    #[test]
    fn test_trimmed_set_comparison() {
        let a = oidc_record(OidcAttributes {
            allowed_audiences: Some(vec!["web ".to_string(), "cli".to_string()]),
            ..Default::default()
        });
        let b = oidc_record(OidcAttributes {
            allowed_audiences: Some(vec!["cli".to_string(), "\nweb".to_string()]),
            ..Default::default()
        });
        assert!(!descriptor(Field::OidcAllowedAudiences).differs(&a, &b));

        let c = oidc_record(OidcAttributes::default());
        assert!(descriptor(Field::OidcAllowedAudiences).differs(&a, &c));
    }

    #[test]
    fn test_signing_algorithms_are_ordered() {
        let a = oidc_record(OidcAttributes {
            signing_algorithms: Some(vec!["RS256".to_string(), "ES256".to_string()]),
            ..Default::default()
        });
        let b = oidc_record(OidcAttributes {
            signing_algorithms: Some(vec!["ES256".to_string(), "RS256".to_string()]),
            ..Default::default()
        });
        assert!(descriptor(Field::OidcSigningAlgorithms).differs(&a, &b));
    }

    #[test]
    fn test_set_option_trims_certificates() {
        let record = oidc_record(OidcAttributes {
            ca_certificates: Some(vec![" PEM\n".to_string()]),
            ..Default::default()
        });
        assert_eq!(
            descriptor(Field::OidcCaCertificates).set_option(&record),
            Some(AuthMethodOption::set(
                Field::OidcCaCertificates,
                FieldValue::List(vec!["PEM".to_string()])
            ))
        );
        assert_eq!(descriptor(Field::OidcIssuer).set_option(&record), None);
    }
}
