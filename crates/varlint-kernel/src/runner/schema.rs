//! Body schemas: which attributes and blocks a rule asks the host for.
//!
//! The host hands back only what a schema names. Anything else in the file
//! is dropped, and a named block with the wrong number of labels is an error.

use crate::ast::{Body, Block};

use super::HostError;

/// Attributes and nested blocks to extract from a body.
#[derive(Debug)]
pub struct BodySchema {
    pub attributes: &'static [&'static str],
    pub blocks: &'static [BlockSchema],
}

#[derive(Debug)]
pub struct BlockSchema {
    pub kind: &'static str,
    /// Label names, in order. The block must carry exactly this many labels.
    pub labels: &'static [&'static str],
    pub body: &'static BodySchema,
}

/// Top-level `variable "name" { ... }` declarations.
pub static VARIABLE_BODY_SCHEMA: BodySchema = BodySchema {
    attributes: &[],
    blocks: &[BlockSchema {
        kind: "variable",
        labels: &["name"],
        body: &VARIABLE_SCHEMA,
    }],
};

static VARIABLE_SCHEMA: BodySchema = BodySchema {
    attributes: &["type", "default", "nullable"],
    blocks: &[BlockSchema {
        kind: "validation",
        labels: &[],
        body: &VALIDATION_SCHEMA,
    }],
};

static VALIDATION_SCHEMA: BodySchema = BodySchema {
    attributes: &["condition", "error_message"],
    blocks: &[],
};

impl BodySchema {
    /// Keep only what this schema names, recursively.
    pub fn extract(&self, filename: &str, body: &Body) -> Result<Body, HostError> {
        let attributes = body
            .attributes
            .iter()
            .filter(|a| self.attributes.contains(&a.name.as_str()))
            .cloned()
            .collect();

        let mut blocks = Vec::new();
        for block in &body.blocks {
            let Some(schema) = self.blocks.iter().find(|s| s.kind == block.kind) else {
                continue;
            };
            blocks.push(schema.extract(filename, block)?);
        }

        Ok(Body { attributes, blocks })
    }
}

impl BlockSchema {
    fn extract(&self, filename: &str, block: &Block) -> Result<Block, HostError> {
        if block.labels.len() != self.labels.len() {
            let message = match self.labels.get(block.labels.len()) {
                Some(missing) => format!("Missing {missing} for {} block", self.kind),
                None => format!(
                    "Extraneous label for {}: only {} labels are expected",
                    self.kind,
                    self.labels.len()
                ),
            };
            return Err(HostError::Content {
                filename: filename.to_string(),
                span: block.def_span,
                message,
            });
        }
        Ok(Block {
            body: self.body.extract(filename, &block.body)?,
            ..block.clone()
        })
    }
}
