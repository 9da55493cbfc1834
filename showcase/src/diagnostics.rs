//! Navigation over chains of optional fields
//!
//! `FieldChain` walks `root.a.b.method()` one access at a time. When an
//! access lands on an absent value it fails with `NullReference`. In
//! `Helpful` mode the failure names the access that failed and the absent
//! expression; in `Terse` mode it only carries the call site.

use std::fmt;
use std::panic::Location;

use thiserror::Error;

/// How much detail a `NullReference` carries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticMode {
    Terse,
    Helpful,
}

/// The access that was attempted on an absent value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    ReadField(String),
    Invoke(String),
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Access::ReadField(name) => write!(f, "Cannot read field \"{}\"", name),
            Access::Invoke(method) => write!(f, "Cannot invoke \"{}()\"", method),
        }
    }
}

/// Dereference through an absent intermediate value
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub struct NullReference {
    access: Access,
    expression: String,
    mode: DiagnosticMode,
    location: &'static Location<'static>,
}

impl NullReference {
    /// The descriptive message, present only in helpful mode
    pub fn detail(&self) -> Option<String> {
        match self.mode {
            DiagnosticMode::Terse => None,
            DiagnosticMode::Helpful => Some(format!(
                "{} because \"{}\" is null",
                self.access, self.expression
            )),
        }
    }

    pub fn mode(&self) -> DiagnosticMode {
        self.mode
    }

    /// Call site of the failing access
    pub fn location(&self) -> &'static Location<'static> {
        self.location
    }
}

impl fmt::Display for NullReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.detail() {
            Some(detail) => write!(f, "NullReference: {}", detail),
            None => f.write_str("NullReference"),
        }
    }
}

/// A position in a chain of field accesses
#[derive(Debug, Clone)]
pub struct FieldChain<'a, T> {
    expression: String,
    value: Option<&'a T>,
    mode: DiagnosticMode,
}

impl<'a, T> FieldChain<'a, T> {
    pub fn root(name: &str, value: &'a T, mode: DiagnosticMode) -> Self {
        Self::root_opt(name, Some(value), mode)
    }

    pub fn root_opt(name: &str, value: Option<&'a T>, mode: DiagnosticMode) -> Self {
        Self {
            expression: name.to_string(),
            value,
            mode,
        }
    }

    /// Read a field of the current value
    #[track_caller]
    pub fn field<U>(
        self,
        name: &str,
        read: impl FnOnce(&'a T) -> Option<&'a U>,
    ) -> Result<FieldChain<'a, U>, NullReference> {
        let value = self.require(Access::ReadField(name.to_string()))?;
        Ok(FieldChain {
            expression: format!("{}.{}", self.expression, name),
            value: read(value),
            mode: self.mode,
        })
    }

    /// Call a method on the current value
    #[track_caller]
    pub fn invoke<R>(self, method: &str, call: impl FnOnce(&'a T) -> R) -> Result<R, NullReference> {
        let value = self.require(Access::Invoke(method.to_string()))?;
        Ok(call(value))
    }

    pub fn get(&self) -> Option<&'a T> {
        self.value
    }

    #[track_caller]
    fn require(&self, access: Access) -> Result<&'a T, NullReference> {
        let location = Location::caller();
        self.value.ok_or_else(|| NullReference {
            access,
            expression: self.expression.clone(),
            mode: self.mode,
            location,
        })
    }
}

/// A person whose address may be missing
#[derive(Debug, Clone, Default)]
pub struct Person {
    pub name: Option<String>,
    pub address: Option<Address>,
}

#[derive(Debug, Clone, Default)]
pub struct Address {
    pub city: Option<String>,
}

/// Evaluate `p.address.city.to_uppercase()`
pub fn city_in_uppercase(person: &Person, mode: DiagnosticMode) -> Result<String, NullReference> {
    FieldChain::root("p", person, mode)
        .field("address", |p| p.address.as_ref())?
        .field("city", |a| a.city.as_ref())?
        .invoke("to_uppercase", |city| city.to_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_address_helpful_message() {
        let person = Person::default();
        let err = city_in_uppercase(&person, DiagnosticMode::Helpful).unwrap_err();
        assert_eq!(
            err.detail().as_deref(),
            Some("Cannot read field \"city\" because \"p.address\" is null")
        );
        assert!(err.to_string().starts_with("NullReference: "));
    }

    #[test]
    fn test_missing_address_terse_message() {
        let person = Person::default();
        let err = city_in_uppercase(&person, DiagnosticMode::Terse).unwrap_err();
        assert!(err.detail().is_none());
        assert_eq!(err.to_string(), "NullReference");
        assert!(err.location().file().ends_with("diagnostics.rs"));
    }

    #[test]
    fn test_both_modes_fail_the_same_way() {
        let person = Person::default();
        let terse = city_in_uppercase(&person, DiagnosticMode::Terse);
        let helpful = city_in_uppercase(&person, DiagnosticMode::Helpful);
        assert!(terse.is_err() && helpful.is_err());
    }

    #[test]
    fn test_missing_city_names_method_call() {
        let person = Person {
            name: Some("An".to_string()),
            address: Some(Address { city: None }),
        };
        let err = city_in_uppercase(&person, DiagnosticMode::Helpful).unwrap_err();
        assert_eq!(
            err.detail().as_deref(),
            Some("Cannot invoke \"to_uppercase()\" because \"p.address.city\" is null")
        );
    }

    #[test]
    fn test_complete_chain_succeeds() {
        let person = Person {
            name: Some("An".to_string()),
            address: Some(Address {
                city: Some("Hue".to_string()),
            }),
        };
        assert_eq!(
            city_in_uppercase(&person, DiagnosticMode::Terse).unwrap(),
            "HUE"
        );
    }

    #[test]
    fn test_absent_root() {
        let chain: FieldChain<'_, Person> = FieldChain::root_opt("p", None, DiagnosticMode::Helpful);
        let err = chain.field("name", |p| p.name.as_ref()).unwrap_err();
        assert_eq!(
            err.detail().as_deref(),
            Some("Cannot read field \"name\" because \"p\" is null")
        );
    }
}
