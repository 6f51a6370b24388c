//! Replaying parsed statements through a [`CommandInterface`].

use tracing::debug;

use plotdoc_model::{ExpressionParts, FitsColumns, Grid2DOptions, HduRef};

use super::ScriptError;
use super::parser::{Call, Literal};
use crate::command::CommandInterface;
use crate::error::DocumentError;
use crate::options::LoadOptions;
use crate::settings::SettingValue;

type Result<T> = std::result::Result<T, ScriptError>;

pub(crate) fn run(
    interface: &mut CommandInterface,
    calls: &[Call],
    options: &LoadOptions,
) -> Result<()> {
    for call in calls {
        debug!(line = call.line, command = %call.name, "running statement");
        dispatch(interface, call, options)?;
    }
    Ok(())
}

fn dispatch(interface: &mut CommandInterface, call: &Call, options: &LoadOptions) -> Result<()> {
    let failed = |source: DocumentError| ScriptError::Command {
        line: call.line,
        command: call.name.clone(),
        source: Box::new(source),
    };

    match call.name.as_str() {
        "Add" => {
            let args = Args::bind(call, &["type", "name", "autoadd"])?;
            interface
                .add(args.string("type")?, args.opt_string("name")?, args.flag("autoadd", true)?)
                .map_err(failed)?;
        }
        "Remove" => {
            let args = Args::bind(call, &["name"])?;
            interface.remove(args.string("name")?).map_err(failed)?;
        }
        "To" => {
            let args = Args::bind(call, &["where"])?;
            interface.to(args.string("where")?).map_err(failed)?;
        }
        "Set" => {
            let args = Args::bind(call, &["var", "val"])?;
            let value = args.setting_value("val")?;
            interface.set(args.string("var")?, value).map_err(failed)?;
        }
        "SetData" => {
            let args = Args::bind(call, &["name", "val", "symerr", "negerr", "poserr"])?;
            interface
                .set_data(
                    args.string("name")?,
                    args.numbers("val")?,
                    args.opt_numbers("symerr")?,
                    args.opt_numbers("negerr")?,
                    args.opt_numbers("poserr")?,
                )
                .map_err(failed)?;
        }
        "SetDataExpression" => {
            let args = Args::bind(
                call,
                &["name", "val", "symerr", "negerr", "poserr", "linked"],
            )?;
            // expressions are always re-evaluated; `linked` is accepted for
            // compatibility only
            args.flag("linked", false)?;
            let formula = |key: &str| -> Result<Option<String>> {
                Ok(args.opt_string(key)?.map(str::to_string))
            };
            let parts = ExpressionParts {
                data: formula("val")?,
                serr: formula("symerr")?,
                nerr: formula("negerr")?,
                perr: formula("poserr")?,
            };
            interface.set_data_expression(args.string("name")?, parts);
        }
        "ImportString" => {
            let args = Args::bind(call, &["descriptor", "string"])?;
            interface
                .import_string(args.string("descriptor")?, args.string("string")?)
                .map_err(failed)?;
        }
        "ImportString2D" => {
            let args = Args::bind(call, &["datasets", "string"])?;
            interface
                .import_string_2d(&args.names("datasets")?, args.string("string")?)
                .map_err(failed)?;
        }
        "ImportFile" => {
            let args = Args::bind(call, &["filename", "descriptor", "useblocks", "linked"])?;
            let path = options.resolve(args.string("filename")?);
            interface
                .import_file(
                    &path,
                    args.string("descriptor")?,
                    args.flag("linked", false)?,
                    args.flag("useblocks", false)?,
                )
                .map_err(failed)?;
        }
        "ImportFile2D" => {
            let args = Args::bind(
                call,
                &[
                    "filename",
                    "datasets",
                    "xrange",
                    "yrange",
                    "invertrows",
                    "invertcols",
                    "transpose",
                    "linked",
                ],
            )?;
            let path = options.resolve(args.string("filename")?);
            let grid_options = Grid2DOptions {
                xrange: args.range("xrange")?,
                yrange: args.range("yrange")?,
                invert_rows: args.opt_flag("invertrows")?,
                invert_cols: args.opt_flag("invertcols")?,
                transpose: args.opt_flag("transpose")?,
            };
            interface
                .import_file_2d(
                    &path,
                    &args.names("datasets")?,
                    &grid_options,
                    args.flag("linked", false)?,
                )
                .map_err(failed)?;
        }
        "ImportFITSFile" => {
            let args = Args::bind(
                call,
                &[
                    "dsname",
                    "filename",
                    "hdu",
                    "datacol",
                    "symerrcol",
                    "poserrcol",
                    "negerrcol",
                    "linked",
                ],
            )?;
            let path = options.resolve(args.string("filename")?);
            let column = |key: &str| -> Result<Option<String>> {
                Ok(args.opt_string(key)?.map(str::to_string))
            };
            let columns = FitsColumns {
                data: column("datacol")?,
                serr: column("symerrcol")?,
                perr: column("poserrcol")?,
                nerr: column("negerrcol")?,
            };
            interface
                .import_fits(
                    args.string("dsname")?,
                    &path,
                    args.hdu("hdu")?,
                    columns,
                    args.flag("linked", false)?,
                )
                .map_err(failed)?;
        }
        _ => {
            return Err(ScriptError::UnknownCommand {
                line: call.line,
                command: call.name.clone(),
            });
        }
    }
    Ok(())
}

/// Arguments of one call matched to parameter names.
struct Args<'a> {
    call: &'a Call,
    params: &'a [&'a str],
    values: Vec<Option<&'a Literal>>,
}

impl<'a> Args<'a> {
    fn bind(call: &'a Call, params: &'a [&'a str]) -> Result<Self> {
        let mut args = Self {
            call,
            params,
            values: vec![None; params.len()],
        };
        if call.args.len() > params.len() {
            return Err(args.error(format!(
                "takes at most {} arguments, {} given",
                params.len(),
                call.args.len()
            )));
        }
        for (slot, value) in args.values.iter_mut().zip(&call.args) {
            *slot = Some(value);
        }
        for (key, value) in &call.kwargs {
            let Some(index) = params.iter().position(|param| *param == key.as_str()) else {
                return Err(args.error(format!("unexpected keyword argument '{key}'")));
            };
            if args.values[index].is_some() {
                return Err(args.error(format!("got multiple values for '{key}'")));
            }
            args.values[index] = Some(value);
        }
        Ok(args)
    }

    fn error(&self, message: impl Into<String>) -> ScriptError {
        ScriptError::Argument {
            line: self.call.line,
            command: self.call.name.clone(),
            message: message.into(),
        }
    }

    /// The argument, treating an explicit `None` as absent.
    fn get(&self, key: &str) -> Option<&'a Literal> {
        let index = self.params.iter().position(|param| *param == key)?;
        self.values
            .get(index)
            .copied()
            .flatten()
            .filter(|value| **value != Literal::None)
    }

    fn wrong_type(&self, key: &str, expected: &str, found: &Literal) -> ScriptError {
        self.error(format!(
            "'{key}' must be {expected}, not {}",
            found.type_name()
        ))
    }

    fn string(&self, key: &str) -> Result<&'a str> {
        self.opt_string(key)?
            .ok_or_else(|| self.error(format!("missing argument '{key}'")))
    }

    fn opt_string(&self, key: &str) -> Result<Option<&'a str>> {
        match self.get(key) {
            None => Ok(None),
            Some(Literal::Str(text)) => Ok(Some(text.as_str())),
            Some(other) => Err(self.wrong_type(key, "a string", other)),
        }
    }

    fn flag(&self, key: &str, default: bool) -> Result<bool> {
        Ok(self.opt_flag(key)?.unwrap_or(default))
    }

    fn opt_flag(&self, key: &str) -> Result<Option<bool>> {
        match self.get(key) {
            None => Ok(None),
            Some(Literal::Bool(value)) => Ok(Some(*value)),
            Some(Literal::Int(value)) => Ok(Some(*value != 0)),
            Some(other) => Err(self.wrong_type(key, "a boolean", other)),
        }
    }

    fn numbers(&self, key: &str) -> Result<Vec<f64>> {
        self.opt_numbers(key)?
            .ok_or_else(|| self.error(format!("missing argument '{key}'")))
    }

    fn opt_numbers(&self, key: &str) -> Result<Option<Vec<f64>>> {
        match self.get(key) {
            None => Ok(None),
            Some(Literal::List(items)) => items
                .iter()
                .map(|item| {
                    item.as_number()
                        .ok_or_else(|| self.wrong_type(key, "a list of numbers", item))
                })
                .collect::<Result<Vec<f64>>>()
                .map(Some),
            Some(other) => Err(self.wrong_type(key, "a list of numbers", other)),
        }
    }

    fn range(&self, key: &str) -> Result<Option<(f64, f64)>> {
        let Some(values) = self.opt_numbers(key)? else {
            return Ok(None);
        };
        match values.as_slice() {
            [low, high] => Ok(Some((*low, *high))),
            _ => Err(self.error(format!("'{key}' must hold two numbers"))),
        }
    }

    /// A single name or a list of names.
    fn names(&self, key: &str) -> Result<Vec<String>> {
        match self.get(key) {
            None => Err(self.error(format!("missing argument '{key}'"))),
            Some(Literal::Str(name)) => Ok(vec![name.clone()]),
            Some(Literal::List(items)) => items
                .iter()
                .map(|item| match item {
                    Literal::Str(name) => Ok(name.clone()),
                    other => Err(self.wrong_type(key, "a list of names", other)),
                })
                .collect(),
            Some(other) => Err(self.wrong_type(key, "a list of names", other)),
        }
    }

    fn hdu(&self, key: &str) -> Result<HduRef> {
        match self.get(key) {
            None => Err(self.error(format!("missing argument '{key}'"))),
            Some(Literal::Str(name)) => Ok(HduRef::Name(name.clone())),
            Some(Literal::Int(index)) => usize::try_from(*index)
                .map(HduRef::Index)
                .map_err(|_| self.error(format!("'{key}' must not be negative"))),
            Some(other) => Err(self.wrong_type(key, "an index or extension name", other)),
        }
    }

    fn setting_value(&self, key: &str) -> Result<SettingValue> {
        match self.get(key) {
            None => Err(self.error(format!("missing argument '{key}'"))),
            Some(Literal::Bool(value)) => Ok(SettingValue::Bool(*value)),
            Some(Literal::Int(value)) => Ok(SettingValue::Int(*value)),
            Some(Literal::Float(value)) => Ok(SettingValue::Float(*value)),
            Some(Literal::Str(text)) => Ok(SettingValue::Text(text.clone())),
            Some(other) => Err(self.wrong_type(key, "a setting value", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use crate::script::parse;

    fn run_script(text: &str) -> Result<CommandInterface> {
        let mut interface = CommandInterface::new(Document::new());
        run(&mut interface, &parse(text)?, &LoadOptions::new())?;
        Ok(interface)
    }

    #[test]
    fn test_builds_tree_and_data() {
        let ci = run_script(
            "SetData('a', [1, 2, 3], symerr=[0.5, 0.5, 0.5])\n\
             Add('page', name='page1', autoadd=False)\n\
             To('page1')\n\
             Add('graph')\n\
             Set('graph1/x/label', 'time')\n",
        )
        .unwrap();
        assert_eq!(ci.current_path(), "/page1");
        assert_eq!(ci.get("graph1/x/label").unwrap(), SettingValue::from("time"));
        let a = ci.get_data("a").unwrap();
        assert_eq!(a.data, vec![1.0, 2.0, 3.0]);
        assert_eq!(a.serr, Some(vec![0.5; 3]));
    }

    #[test]
    fn test_expression_with_unset_values() {
        let ci = run_script("SetDataExpression('e', None, symerr='1', linked=True)\n").unwrap();
        let Some(ds) = ci.document().dataset("e").unwrap().as_expression() else {
            panic!("expected an expression dataset");
        };
        assert_eq!(ds.parts().data, None);
        assert_eq!(ds.parts().serr.as_deref(), Some("1"));
    }

    #[test]
    fn test_argument_errors() {
        let err = run_script("To('/')\nAdd('page', colour='red')\n").unwrap_err();
        assert!(matches!(err, ScriptError::Argument { line: 2, .. }), "{err}");

        let err = run_script("SetData('a', 'abc')").unwrap_err();
        assert!(err.to_string().contains("list of numbers"), "{err}");

        let err = run_script("Set('label')").unwrap_err();
        assert!(err.to_string().contains("missing argument 'val'"), "{err}");
    }

    #[test]
    fn test_unknown_command_and_failures() {
        let err = run_script("Frobnicate(1)").unwrap_err();
        assert!(matches!(err, ScriptError::UnknownCommand { line: 1, .. }));

        let err = run_script("\nTo('nowhere')").unwrap_err();
        let ScriptError::Command { line, source, .. } = err else {
            panic!("expected a command failure");
        };
        assert_eq!(line, 2);
        assert!(matches!(*source, DocumentError::Path(_)));
    }
}
