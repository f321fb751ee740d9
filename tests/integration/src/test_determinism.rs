//! Output stability: repeated and reordered inputs compile identically.

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use rustack_events_core::{flatten, validation};

    use crate::{compile_ok, compiler, load_spec};

    #[test]
    fn test_should_produce_byte_identical_output() -> anyhow::Result<()> {
        let spec = load_spec("full");
        let first = serde_json::to_string(&compile_ok(&spec))?;
        let second = serde_json::to_string(&compile_ok(&spec))?;
        assert_eq!(first, second);
        Ok(())
    }

    #[test]
    fn test_should_ignore_declaration_order() -> anyhow::Result<()> {
        let spec = load_spec("full");
        let mut reordered = spec.clone();
        reordered.buses.reverse();
        for bus in &mut reordered.buses {
            bus.rules.reverse();
            for rule in &mut bus.rules {
                rule.targets.reverse();
            }
        }

        assert_eq!(
            serde_json::to_string(&compile_ok(&spec))?,
            serde_json::to_string(&compile_ok(&reordered))?
        );
        Ok(())
    }

    #[test]
    fn test_should_round_trip_flatten_and_renest() {
        let spec = load_spec("full");
        let validated = validation::validate(&spec).expect("valid specification");
        let flat = flatten::flatten(&validated, &compiler().config);

        let original: BTreeSet<(String, String, String)> = spec
            .buses
            .iter()
            .flat_map(|bus| {
                bus.rules.iter().flat_map(move |rule| {
                    rule.targets
                        .iter()
                        .map(move |t| (bus.name.clone(), rule.name.clone(), t.id.clone()))
                })
            })
            .collect();
        let renested: BTreeSet<(String, String, String)> = flat
            .renest()
            .into_iter()
            .flat_map(|(bus, rules)| {
                rules.into_iter().flat_map(move |(rule, targets)| {
                    let bus = bus.clone();
                    targets
                        .into_iter()
                        .map(move |target| (bus.clone(), rule.clone(), target))
                })
            })
            .collect();

        assert_eq!(original, renested);
        assert_eq!(original.len(), flat.targets.len());
    }
}
