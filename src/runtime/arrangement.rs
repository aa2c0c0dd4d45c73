//! Classification of a scenario's members into setup, teardown and tests.

use std::fmt;
use std::rc::Rc;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::VerityError;
use crate::location::Location;
use crate::object::{ClassDef, FunctionDef, Instance, ModuleIndex, Object};

use super::container::{Container, Owner};

// ============================================================================
// CLASSIFICATION RULES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Setup,
    Teardown,
    Test,
}

static SETUP: Lazy<Regex> =
    Lazy::new(|| Regex::new("^(setup|set_up|setUp)").expect("static pattern compiles"));
static TEARDOWN: Lazy<Regex> = Lazy::new(|| {
    Regex::new("^(teardown|tear_down|tearDown)").expect("static pattern compiles")
});
static TEST: Lazy<Regex> =
    Lazy::new(|| Regex::new("^(test|spec|scenario)").expect("static pattern compiles"));

#[derive(Clone)]
enum Predicate {
    Pattern(Regex),
    Custom(Rc<dyn Fn(&str) -> bool>),
}

impl Predicate {
    fn matches(&self, name: &str) -> bool {
        match self {
            Predicate::Pattern(regex) => regex.is_match(name),
            Predicate::Custom(f) => f(name),
        }
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Pattern(regex) => write!(f, "/{}/", regex.as_str()),
            Predicate::Custom(_) => f.write_str("<custom>"),
        }
    }
}

/// Ordered `(predicate, role)` pairs. The first predicate matching a member
/// name decides its role.
#[derive(Debug, Clone)]
pub struct ClassificationRules {
    rules: Vec<(Predicate, Role)>,
}

impl Default for ClassificationRules {
    fn default() -> Self {
        Self {
            rules: vec![
                (Predicate::Pattern(SETUP.clone()), Role::Setup),
                (Predicate::Pattern(TEARDOWN.clone()), Role::Teardown),
                (Predicate::Pattern(TEST.clone()), Role::Test),
            ],
        }
    }
}

impl ClassificationRules {
    /// A rule set that classifies nothing.
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    pub fn with_pattern(mut self, pattern: &str, role: Role) -> Result<Self, VerityError> {
        let regex = Regex::new(pattern).map_err(|source| VerityError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })?;
        self.rules.push((Predicate::Pattern(regex), role));
        Ok(self)
    }

    pub fn with_predicate<F>(mut self, predicate: F, role: Role) -> Self
    where
        F: Fn(&str) -> bool + 'static,
    {
        self.rules.push((Predicate::Custom(Rc::new(predicate)), role));
        self
    }

    pub fn classify(&self, name: &str) -> Option<Role> {
        self.rules
            .iter()
            .find(|(predicate, _)| predicate.matches(name))
            .map(|(_, role)| *role)
    }

    pub fn seem_to_indicate_setup(&self, name: &str) -> bool {
        self.classify(name) == Some(Role::Setup)
    }

    pub fn seem_to_indicate_teardown(&self, name: &str) -> bool {
        self.classify(name) == Some(Role::Teardown)
    }

    pub fn seem_to_indicate_test(&self, name: &str) -> bool {
        self.classify(name) == Some(Role::Test)
    }
}

// ============================================================================
// ARRANGEMENT
// ============================================================================

/// What an arrangement was built from.
#[derive(Debug, Clone)]
pub enum Source {
    Function(FunctionDef),
    Class(ClassDef),
}

impl Source {
    pub fn name(&self) -> &str {
        match self {
            Source::Function(function) => &function.name,
            Source::Class(class) => &class.name,
        }
    }

    fn object(&self) -> Object<'_> {
        match self {
            Source::Function(function) => Object::Function(function),
            Source::Class(class) => Object::Class(class),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScenarioArrangement {
    pub name: String,
    pub source: Source,
    pub source_instance: Option<Instance>,
    pub setup_methods: Vec<Container>,
    pub teardown_methods: Vec<Container>,
    pub test_methods: Vec<Container>,
    pub nested_containers: Vec<ScenarioArrangement>,
    pub location: Location,
    runnable: bool,
}

impl ScenarioArrangement {
    /// Classifies `source` into setup, teardown and test containers.
    ///
    /// A class whose constructor takes parameters is not instantiated; its
    /// arrangement is empty and not runnable.
    pub fn arrange(
        source: Source,
        rules: &ClassificationRules,
        index: &ModuleIndex,
    ) -> Result<Self, VerityError> {
        let location = Location::resolve(source.object(), index)?;
        let mut arrangement = ScenarioArrangement {
            name: source.name().to_string(),
            source_instance: None,
            setup_methods: Vec::new(),
            teardown_methods: Vec::new(),
            test_methods: Vec::new(),
            nested_containers: Vec::new(),
            location,
            runnable: true,
            source: source.clone(),
        };

        match &source {
            Source::Function(function) => {
                let location = arrangement.location.clone();
                arrangement.test_methods.push(Container::new(
                    function.name.clone(),
                    function.body.clone(),
                    location,
                    Owner::Module(function.module.clone()),
                ));
            }
            Source::Class(class) => {
                let Some(instance) = class.instantiate() else {
                    tracing::debug!(
                        class = %class.name,
                        arity = class.arity(),
                        "class needs constructor arguments, not runnable"
                    );
                    arrangement.runnable = false;
                    return Ok(arrangement);
                };
                arrangement.classify_methods(class, &instance, rules, index)?;
                for nested in &class.nested {
                    arrangement.nested_containers.push(Self::arrange(
                        Source::Class(nested.clone()),
                        rules,
                        index,
                    )?);
                }
                arrangement.source_instance = Some(instance);
            }
        }

        Ok(arrangement)
    }

    fn classify_methods(
        &mut self,
        class: &ClassDef,
        instance: &Instance,
        rules: &ClassificationRules,
        index: &ModuleIndex,
    ) -> Result<(), VerityError> {
        for method in &class.methods {
            let Some(role) = rules.classify(&method.name) else {
                continue;
            };
            let location = Location::resolve(Object::Method { class, method }, index)?;
            let container = Container::new(
                method.name.clone(),
                instance.bind(method),
                location,
                Owner::Instance(class.name.clone()),
            );
            match role {
                Role::Setup => self.setup_methods.push(container),
                Role::Teardown => self.teardown_methods.push(container),
                Role::Test => self.test_methods.push(container),
            }
        }
        Ok(())
    }

    /// True when the source was instantiated or needs no instantiation.
    pub fn is_runnable(&self) -> bool {
        self.runnable
    }

    /// Flattens the nesting tree depth-first, keeping every arrangement that
    /// declares tests of its own. Each keeps only its direct tests.
    pub fn uncollapse_nested(&self) -> Vec<&ScenarioArrangement> {
        let mut flat = Vec::new();
        self.collect_leaves(&mut flat);
        flat
    }

    fn collect_leaves<'a>(&'a self, flat: &mut Vec<&'a ScenarioArrangement>) {
        if !self.test_methods.is_empty() {
            flat.push(self);
        }
        for nested in &self.nested_containers {
            nested.collect_leaves(flat);
        }
    }
}
