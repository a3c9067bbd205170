use std::fmt::{self, Display, Formatter, Write};

use crate::merge::TypeDefs;
use crate::model::{DirectiveUse, FieldDef, InputValueDef, TypeDef, TypeDefKind};

impl Display for TypeDefs {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut first = true;
        let roots = self.roots();
        if !roots.is_default() {
            writeln!(f, "schema {{")?;
            for (operation, name) in [
                ("query", &roots.query),
                ("mutation", &roots.mutation),
                ("subscription", &roots.subscription),
            ] {
                if self.get(name).is_some() {
                    writeln!(f, "  {operation}: {name}")?;
                }
            }
            writeln!(f, "}}")?;
            first = false;
        }

        for ty in self.types() {
            if !first {
                writeln!(f)?;
            }
            first = false;
            write!(f, "{ty}")?;
        }
        Ok(())
    }
}

impl Display for TypeDef {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write_description(f, self.description.as_deref(), "")?;
        write!(f, "{} {}", self.kind.keyword(), self.name)?;

        match &self.kind {
            TypeDefKind::Scalar => {
                write_directives(f, &self.directives)?;
                writeln!(f)
            }
            TypeDefKind::Object { implements, fields }
            | TypeDefKind::Interface { implements, fields } => {
                if !implements.is_empty() {
                    write!(f, " implements {}", implements.join(" & "))?;
                }
                write_directives(f, &self.directives)?;
                writeln!(f, " {{")?;
                for field in fields.values() {
                    write!(f, "{field}")?;
                }
                writeln!(f, "}}")
            }
            TypeDefKind::Union { members } => {
                write_directives(f, &self.directives)?;
                writeln!(f, " = {}", members.join(" | "))
            }
            TypeDefKind::Enum { values } => {
                write_directives(f, &self.directives)?;
                writeln!(f, " {{")?;
                for value in values {
                    write_description(f, value.description.as_deref(), "  ")?;
                    write!(f, "  {}", value.name)?;
                    write_directives(f, &value.directives)?;
                    writeln!(f)?;
                }
                writeln!(f, "}}")
            }
            TypeDefKind::InputObject { fields } => {
                write_directives(f, &self.directives)?;
                writeln!(f, " {{")?;
                for field in fields.values() {
                    write_description(f, field.description.as_deref(), "  ")?;
                    writeln!(f, "  {field}")?;
                }
                writeln!(f, "}}")
            }
        }
    }
}

impl Display for FieldDef {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write_description(f, self.description.as_deref(), "  ")?;
        write!(f, "  {}", self.name)?;
        if !self.arguments.is_empty() {
            f.write_char('(')?;
            for (i, argument) in self.arguments.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{argument}")?;
            }
            f.write_char(')')?;
        }
        write!(f, ": {}", self.ty)?;
        write_directives(f, &self.directives)?;
        writeln!(f)
    }
}

impl Display for InputValueDef {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.ty)?;
        if let Some(default) = &self.default_value {
            write!(f, " = {default}")?;
        }
        write_directives(f, &self.directives)
    }
}

impl Display for DirectiveUse {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.name)?;
        if !self.arguments.is_empty() {
            f.write_char('(')?;
            for (i, (name, value)) in self.arguments.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{name}: {value}")?;
            }
            f.write_char(')')?;
        }
        Ok(())
    }
}

fn write_directives(f: &mut Formatter<'_>, directives: &[DirectiveUse]) -> fmt::Result {
    for directive in directives {
        write!(f, " {directive}")?;
    }
    Ok(())
}

fn write_description(f: &mut Formatter<'_>, description: Option<&str>, indent: &str) -> fmt::Result {
    match description {
        Some(text) => writeln!(f, "{indent}\"\"\"{}\"\"\"", text.replace("\"\"\"", "\\\"\"\"")),
        None => Ok(()),
    }
}
