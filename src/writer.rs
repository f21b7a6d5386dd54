//! Generated module emission (Emitter)
//!
//! Serializes compiled methods into a single Python source artifact: header
//! comment, import lines, class declaration with a constructor assigning
//! each inherited property, then one method block per endpoint.

use std::io::Write;

use crate::synth::GeneratedMethod;

const HEADER: &str = "# This python file is auto-generated. Please do not edit.\n";

/// Streams one generated module to any writer.
#[derive(Debug)]
pub struct ModuleWriter<W: Write> {
    out: W,
}

impl<W: Write> ModuleWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn write_header(&mut self) -> std::io::Result<()> {
        self.out.write_all(HEADER.as_bytes())
    }

    pub fn write_imports(&mut self, imports: &[String]) -> std::io::Result<()> {
        for import in imports {
            writeln!(self.out, "{import}")?;
        }
        writeln!(self.out)?;
        writeln!(self.out)
    }

    /// Class declaration plus a constructor taking one parameter per
    /// inherited property and assigning it to the same-named attribute.
    pub fn write_class(
        &mut self,
        class_name: &str,
        inherited_properties: &[String],
    ) -> std::io::Result<()> {
        writeln!(self.out, "class {class_name}:")?;
        write!(self.out, "\tdef __init__(self, ")?;
        for prop in inherited_properties {
            write!(self.out, "{prop}, ")?;
        }
        writeln!(self.out, "):")?;
        for prop in inherited_properties {
            writeln!(self.out, "\t\tself.{prop} = {prop}")?;
        }
        writeln!(self.out)
    }

    /// One method block, synthesized at class-member depth, followed by a
    /// blank line.
    pub fn write_method(&mut self, method: &GeneratedMethod) -> std::io::Result<()> {
        writeln!(self.out, "{}", method.source())?;
        writeln!(self.out)
    }
}
