use std::collections::HashSet;

use appstudio_api::crd::{
    BindingComponent, BindingComponentConfiguration, ComponentName, SnapshotEnvironmentBindingSpec,
};
use appstudio_api::validation::ValidationError;
use proptest::prelude::*;

fn binding_with(names: &[String]) -> SnapshotEnvironmentBindingSpec {
    names.iter().fold(
        SnapshotEnvironmentBindingSpec::new("pet-clinic", "staging", "snapshot-1"),
        |spec, name| spec.with_component(BindingComponent::new(name.as_str())),
    )
}

proptest! {
    #[test]
    fn duplicate_component_names_are_flagged(names in prop::collection::vec("[a-c]{1,2}", 0..8)) {
        let unique: HashSet<&String> = names.iter().collect();
        let result = binding_with(&names).validate();

        if unique.len() == names.len() {
            prop_assert_eq!(result, Ok(()));
        } else {
            let first_repeat = names
                .iter()
                .enumerate()
                .find(|(idx, name)| names[..*idx].contains(*name))
                .map(|(_, name)| ComponentName::from(name.as_str()))
                .unwrap();
            prop_assert_eq!(result, Err(ValidationError::DuplicateComponent(first_repeat)));
        }
    }

    #[test]
    fn duplicate_env_names_are_flagged(vars in prop::collection::vec(("[A-C]{1,2}", "[a-z]{0,4}"), 0..6)) {
        let config = vars
            .iter()
            .fold(BindingComponentConfiguration::with_replicas(1), |c, (name, value)| {
                c.env(name.as_str(), value.as_str())
            });
        let spec = SnapshotEnvironmentBindingSpec::new("pet-clinic", "staging", "snapshot-1")
            .with_component(BindingComponent::new("api").with_configuration(config));

        let unique: HashSet<&String> = vars.iter().map(|(name, _)| name).collect();
        let flagged = matches!(spec.validate(), Err(ValidationError::DuplicateEnvVar { .. }));
        prop_assert_eq!(flagged, unique.len() != vars.len());
    }
}
