use async_trait::async_trait;

use super::Scenario;
use crate::config::ShowcaseConfig;
use crate::diagnostics::{Address, DiagnosticMode, Person, city_in_uppercase};
use crate::transcript::Transcript;

/// Terse versus helpful reports for `p.address.city.to_uppercase()`
pub struct NullReferenceDiagnostics;

#[async_trait]
impl Scenario for NullReferenceDiagnostics {
    fn name(&self) -> &'static str {
        "diagnostics"
    }

    fn title(&self) -> &'static str {
        "Helpful null-reference diagnostics"
    }

    async fn run(&self, _config: &ShowcaseConfig, out: &mut Transcript) -> anyhow::Result<()> {
        // `address` was never filled in
        let person = Person {
            name: Some("Mai".to_string()),
            address: None,
        };

        out.section("1. Terse diagnostics");
        evaluate(out, &person, DiagnosticMode::Terse)?;

        out.section("2. Helpful diagnostics");
        evaluate(out, &person, DiagnosticMode::Helpful)?;

        out.section("3. The last link is absent");
        let no_city = Person {
            name: Some("Trang".to_string()),
            address: Some(Address { city: None }),
        };
        evaluate(out, &no_city, DiagnosticMode::Helpful)?;

        out.section("4. Fully populated chain");
        let complete = Person {
            name: Some("Tuan".to_string()),
            address: Some(Address {
                city: Some("Hanoi".to_string()),
            }),
        };
        let city = city_in_uppercase(&complete, DiagnosticMode::Helpful)?;
        out.line(format!("p.address.city.to_uppercase() = {}", city));
        Ok(())
    }
}

/// Evaluate the chain and report the expected failure
fn evaluate(out: &mut Transcript, person: &Person, mode: DiagnosticMode) -> anyhow::Result<()> {
    match city_in_uppercase(person, mode) {
        Err(e) => {
            out.line(format!("Caught {}", e));
            out.line(format!("    at {}", e.location()));
            Ok(())
        }
        Ok(city) => anyhow::bail!("expected an absent link, got {}", city),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_only_helpful_mode_names_the_access() {
        let mut out = Transcript::silent();
        NullReferenceDiagnostics
            .run(&ShowcaseConfig::default(), &mut out)
            .await
            .unwrap();

        let terse = out.position("--- 1. Terse").unwrap();
        assert_eq!(out.lines()[terse + 1], "Caught NullReference");
        assert!(out.contains(
            "Caught NullReference: Cannot read field \"city\" because \"p.address\" is null"
        ));
        assert!(out.contains(
            "Cannot invoke \"to_uppercase()\" because \"p.address.city\" is null"
        ));
        assert!(out.contains("p.address.city.to_uppercase() = HANOI"));
    }
}
