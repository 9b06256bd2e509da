//! Text front-ends: the indentation parser, the register definition grammar
//! and the flat format read by the field writer.

pub mod fielddefs;
pub mod indent;
pub(crate) mod literals;
pub mod regdefs;

use std::{fs, path::Path};

use crate::soc::regs::RegResult;
use crate::soc::regs::ast::{Definitions, FlatDefinitions};

/// Knobs shared by the definition parsers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParseOptions {
    /// Report recoverable oddities, such as discarded documentation, through `log::warn!`.
    pub warn: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self { warn: true }
    }
}

/// Loads register definition sources in order. Each source sees the shared
/// definitions of the ones before it, and their top level groups as shared
/// definitions too.
#[derive(Debug, Default)]
pub struct DefinitionLoader {
    options: ParseOptions,
    defs: Definitions,
    warnings: Vec<String>,
}

impl DefinitionLoader {
    pub fn new(options: ParseOptions) -> Self {
        Self {
            options,
            defs: Definitions::default(),
            warnings: Vec::new(),
        }
    }

    pub fn options(&self) -> ParseOptions {
        self.options
    }

    pub fn load_str(&mut self, src: &str) -> RegResult<&mut Self> {
        let (nodes, warnings) = indent::parse_indented_with_warnings(src, self.options)?;
        self.warnings.extend(warnings);
        self.defs = regdefs::parse_register_defs(&nodes, self.defs.clone())?;
        Ok(self)
    }

    pub fn load_file(&mut self, path: impl AsRef<Path>) -> RegResult<&mut Self> {
        let src = fs::read_to_string(path)?;
        self.load_str(&src)
    }

    /// Warnings raised by every source loaded so far, empty unless `options.warn` is set.
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Definitions accumulated so far, shared references unresolved.
    pub fn definitions(&self) -> &Definitions {
        &self.defs
    }

    pub fn flatten(&self) -> RegResult<FlatDefinitions> {
        regdefs::flatten(&self.defs)
    }

    pub fn finish(self) -> Definitions {
        self.defs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::soc::regs::RegError;

    #[test]
    fn later_sources_build_on_earlier_groups() {
        let mut loader = DefinitionLoader::new(ParseOptions { warn: false });
        loader
            .load_str("LIMIT = 7\n!UART\n    DATA RW\n    STAT R\n")
            .expect("first source")
            .load_str("!SOC\n    ID R\n    :UART UART0\n    :UART UART1\n")
            .expect("second source");

        let flat = loader.flatten().expect("flatten");
        assert_eq!(flat.groups.len(), 1, "only the latest source's groups are returned");
        assert_eq!(flat.constant("LIMIT"), Some(7));
        let soc = flat.group("SOC").expect("SOC");
        assert_eq!(soc.span, 5);
    }

    #[test]
    fn failed_source_reports_its_line() {
        let mut loader = DefinitionLoader::default();
        let err = loader.load_str("!G\n    A RW\n    B\n").expect_err("missing mode");
        assert!(
            matches!(err, RegError::Parse { line: 3, .. }),
            "unexpected error {err:?}"
        );
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let mut loader = DefinitionLoader::default();
        let err = loader
            .load_file("/nonexistent/regmap/defs.regs")
            .expect_err("file does not exist");
        assert!(matches!(err, RegError::Io(_)));
    }

    #[test]
    fn loader_keeps_warnings_across_sources() {
        let mut loader = DefinitionLoader::default();
        loader.load_str("!A\n    X RW\n# lost\n\n!B\n    Y RW\n").expect("first source");
        loader.load_str("!C\n    Z RW\n# trailing\n").expect("second source");
        assert_eq!(loader.warnings().len(), 2, "one per discarded doc block");

        let mut quiet = DefinitionLoader::new(ParseOptions { warn: false });
        quiet.load_str("!A\n    X RW\n# lost\n\n!B\n    Y RW\n").expect("source");
        assert!(quiet.warnings().is_empty());
    }

    #[test]
    fn default_options_warn() {
        assert!(ParseOptions::default().warn);
        assert!(DefinitionLoader::default().options().warn, "Default derives through ParseOptions");
    }
}
