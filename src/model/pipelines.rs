//! Current and custom pipeline definitions

use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};

use super::request::{Headers, RequestDescriptor};

/// The default ordered sequence in a configuration file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CurrentPipeline {
    /// Headers applied to every step
    pub global_headers: Option<Headers>,
    /// Steps, executed in order
    pub pipeline: Vec<RequestDescriptor>,
}

/// Named sequences that can be run one at a time or all together
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CustomPipelines {
    /// Headers applied to every step of every named pipeline
    pub global_headers: Option<Headers>,
    /// Named pipelines in file order
    #[serde(deserialize_with = "ordered_pipelines")]
    pub pipelines: Vec<NamedPipeline>,
}

/// One named custom pipeline
#[derive(Debug, Clone, PartialEq)]
pub struct NamedPipeline {
    pub name: String,
    pub steps: Vec<RequestDescriptor>,
}

impl CustomPipelines {
    /// Look up a pipeline by name
    pub fn get(&self, name: &str) -> Option<&NamedPipeline> {
        self.pipelines.iter().find(|p| p.name == name)
    }

    /// Pipeline names in file order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.pipelines.iter().map(|p| p.name.as_str())
    }
}

/// Deserialize a name -> steps mapping, keeping the order of the file
fn ordered_pipelines<'de, D>(deserializer: D) -> Result<Vec<NamedPipeline>, D::Error>
where
    D: Deserializer<'de>,
{
    struct OrderedVisitor;

    impl<'de> Visitor<'de> for OrderedVisitor {
        type Value = Vec<NamedPipeline>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a map of pipeline names to request lists")
        }

        fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut pipelines: Vec<NamedPipeline> = Vec::new();
            while let Some((name, steps)) = map.next_entry::<String, Vec<RequestDescriptor>>()? {
                if pipelines.iter().any(|p| p.name == name) {
                    return Err(serde::de::Error::custom(format!(
                        "duplicate custom pipeline '{}'",
                        name
                    )));
                }
                pipelines.push(NamedPipeline { name, steps });
            }
            Ok(pipelines)
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(Vec::new())
        }
    }

    deserializer.deserialize_any(OrderedVisitor)
}
