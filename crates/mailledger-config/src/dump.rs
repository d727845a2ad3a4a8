//! Text dump of the current configuration.
//!
//! Produces the listing shown by the `set` and `set all` commands: one line
//! per variable, globals sorted by name, followed by each scope's variables
//! as `scope:name`.

use crate::error::Result;
use crate::set::{ConfigSet, VarKey};

/// Line format of a dump.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DumpStyle {
    /// `name = value`
    #[default]
    Neo,
    /// `set name=value`, suitable for pasting into a config file.
    Mutt,
}

/// Options for [`dump`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DumpOptions {
    style: DumpStyle,
    only_changed: bool,
    show_defaults: bool,
}

impl DumpOptions {
    /// Every variable, Neo style, no defaults.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            style: DumpStyle::Neo,
            only_changed: false,
            show_defaults: false,
        }
    }

    /// Sets the line format.
    #[must_use]
    pub const fn style(mut self, style: DumpStyle) -> Self {
        self.style = style;
        self
    }

    /// Lists only variables differing from their initial value, and only
    /// scoped variables that hold their own value.
    #[must_use]
    pub const fn only_changed(mut self, only_changed: bool) -> Self {
        self.only_changed = only_changed;
        self
    }

    /// Appends `# default: <initial>` to lines whose value was changed.
    #[must_use]
    pub const fn show_defaults(mut self, show_defaults: bool) -> Self {
        self.show_defaults = show_defaults;
        self
    }
}

/// Renders the configuration as text, one variable per line.
///
/// # Errors
///
/// Fails with the error of the first variable that cannot be rendered,
/// such as one registered with an unknown type.
pub fn dump(cs: &ConfigSet, options: DumpOptions) -> Result<String> {
    let mut out = String::new();

    let mut globals: Vec<&str> = cs.var_names().collect();
    globals.sort_unstable();
    for name in globals {
        let key = cs.resolve(name)?;
        let changed = cs.native_get(&key)? != cs.initial_native(key.var());
        if options.only_changed && !changed {
            continue;
        }
        write_line(cs, &mut out, key, changed, options)?;
    }

    for (scope, s) in cs.scopes.iter_sorted() {
        let mut vars: Vec<(VarKey, bool)> = s
            .vars
            .iter()
            .map(|&(var, sv)| (VarKey::Scoped { scope, var }, sv.is_set))
            .collect();
        vars.sort_by_cached_key(|&(key, _)| cs.key_name(key));

        for (key, is_set) in vars {
            if options.only_changed && !is_set {
                continue;
            }
            let changed = cs.native_get(&key)? != cs.initial_native(key.var());
            write_line(cs, &mut out, key, changed, options)?;
        }
    }

    Ok(out)
}

fn write_line(
    cs: &ConfigSet,
    out: &mut String,
    key: VarKey,
    changed: bool,
    options: DumpOptions,
) -> Result<()> {
    let name = cs.key_name(key);
    let value = cs.string_get(&key)?;
    let line = match options.style {
        DumpStyle::Neo => format!("{name} = {value}"),
        DumpStyle::Mutt => format!("set {name}={value}"),
    };
    out.push_str(&line);

    if options.show_defaults && changed {
        let initial = cs.initial_get(&key)?;
        out.push_str("  # default: ");
        out.push_str(&initial);
    }
    out.push('\n');
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::definition::{RegisterFlags, Storage, VarType, VariableDef};
    use crate::error::Error;
    use crate::types::{DataType, SortContext, SortKey, SortOrder};

    fn setup() -> ConfigSet {
        let mut cs = ConfigSet::with_default_types();
        cs.register(
            vec![
                VariableDef::new("sort", SortContext::Index.var_type(), &Storage::new())
                    .with_initial(SortOrder::new(SortKey::Date).to_native()),
                VariableDef::new("beep", VarType::new(DataType::BOOL, 0), &Storage::new())
                    .with_initial(1),
                VariableDef::new(
                    "sort_alias",
                    SortContext::Alias.var_type(),
                    &Storage::new(),
                )
                .with_initial(SortOrder::new(SortKey::Alias).to_native()),
            ],
            RegisterFlags::NONE,
        )
        .unwrap();
        cs
    }

    #[test]
    fn test_dump_all_sorted() {
        let cs = setup();
        let text = dump(&cs, DumpOptions::new()).unwrap();
        assert_eq!(text, "beep = yes\nsort = date\nsort_alias = alias\n");
    }

    #[test]
    fn test_dump_mutt_style_changed_only() {
        let mut cs = setup();
        cs.string_set("sort", "reverse-score").unwrap();

        let options = DumpOptions::new()
            .style(DumpStyle::Mutt)
            .only_changed(true)
            .show_defaults(true);
        let text = dump(&cs, options).unwrap();
        assert_eq!(text, "set sort=reverse-score  # default: date\n");
    }

    #[test]
    fn test_dump_scopes_after_globals() {
        let mut cs = setup();
        cs.create_scope("work", &["sort_alias", "sort"]).unwrap();
        cs.create_scope("home", &["beep"]).unwrap();
        cs.string_set("work:sort", "from").unwrap();

        let text = dump(&cs, DumpOptions::new()).unwrap();
        assert_eq!(
            text,
            "beep = yes\nsort = date\nsort_alias = alias\n\
             home:beep = yes\nwork:sort = from\nwork:sort_alias = alias\n"
        );

        let text = dump(&cs, DumpOptions::new().only_changed(true)).unwrap();
        assert_eq!(text, "work:sort = from\n");
    }

    #[test]
    fn test_dump_fails_on_unrenderable() {
        let mut cs = setup();
        cs.register(
            vec![VariableDef::new("mystery", VarType::new(DataType(42), 0), &Storage::new())],
            RegisterFlags::ALLOW_UNKNOWN_TYPE,
        )
        .unwrap();

        let err = dump(&cs, DumpOptions::new()).unwrap_err();
        assert!(matches!(err, Error::UnknownType { .. }));
    }
}
