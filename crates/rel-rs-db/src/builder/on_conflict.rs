//! Conflict clauses for INSERT (`ON CONFLICT`, `ON DUPLICATE KEY`).

use rel_rs_core::{RelError, RelResult};

use super::buffer::Buffer;
use crate::mutate::{ConflictAction, Mutates, OnConflict};

/// Dialect wording for the conflict clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OnConflictBuilder {
    /// Clause keyword, e.g. `ON CONFLICT`.
    pub statement: &'static str,
    /// Keyword for ignoring, e.g. `DO NOTHING`. Empty when the dialect has
    /// none, in which case ignore becomes a no-op self-assignment.
    pub ignore_statement: &'static str,
    /// Keyword introducing assignments, e.g. `DO UPDATE SET`.
    pub update_statement: &'static str,
    /// Pseudo-table holding the proposed row, e.g. `excluded`.
    pub table_qualifier: &'static str,
    /// Whether the conflict target columns are rendered.
    pub support_key: bool,
    /// Assign with `VALUES(field)` instead of the qualifier.
    pub use_values: bool,
}

impl OnConflictBuilder {
    /// `ON CONFLICT (...) DO NOTHING | DO UPDATE SET f="excluded"."f"`
    pub const EXCLUDED: Self = Self {
        statement: "ON CONFLICT",
        ignore_statement: "DO NOTHING",
        update_statement: "DO UPDATE SET",
        table_qualifier: "excluded",
        support_key: true,
        use_values: false,
    };

    /// `ON DUPLICATE KEY UPDATE f=VALUES(f)`
    pub const DUPLICATE_KEY: Self = Self {
        statement: "ON DUPLICATE KEY",
        ignore_statement: "",
        update_statement: "UPDATE",
        table_qualifier: "",
        support_key: false,
        use_values: true,
    };

    /// Writes the clause for a single-row insert. Only [`Mutate::Set`]
    /// fields take part, as those are the inserted columns.
    ///
    /// # Errors
    ///
    /// See [`OnConflictBuilder::write`].
    pub fn write_mutates(
        &self,
        buffer: &mut Buffer,
        mutates: &Mutates,
        on_conflict: &OnConflict,
    ) -> RelResult<()> {
        let fields: Vec<String> = mutates
            .iter()
            .filter(|(_, m)| m.set_value().is_some())
            .map(|(field, _)| field.clone())
            .collect();
        self.write(buffer, &fields, on_conflict)
    }

    /// Writes the clause. `fields` are the inserted columns.
    ///
    /// A replace with no inserted columns has nothing to overwrite and is
    /// written as an ignore. Where the dialect has no ignore keyword, the
    /// ignore assigns the first column (or conflict key) to itself.
    ///
    /// # Errors
    ///
    /// Returns [`RelError::InvalidQuery`] for an ignore on such a dialect
    /// when there is neither a column nor a key to assign.
    pub fn write(
        &self,
        buffer: &mut Buffer,
        fields: &[String],
        on_conflict: &OnConflict,
    ) -> RelResult<()> {
        let ignore = ConflictAction::Ignore;
        let action = match &on_conflict.action {
            None => return Ok(()),
            Some(ConflictAction::Replace) if fields.is_empty() => &ignore,
            Some(action) => action,
        };

        let self_assigned = match action {
            ConflictAction::Ignore if self.ignore_statement.is_empty() => {
                let field = fields.first().or_else(|| on_conflict.keys.first());
                if field.is_none() {
                    return Err(RelError::InvalidQuery(format!(
                        "{}: ignoring a conflict needs an inserted field or a conflict key",
                        self.statement
                    )));
                }
                field
            }
            _ => None,
        };

        buffer.write_char(' ');
        buffer.write_str(self.statement);

        if self.support_key && !on_conflict.keys.is_empty() {
            buffer.write_char('(');
            for (i, key) in on_conflict.keys.iter().enumerate() {
                if i > 0 {
                    buffer.write_char(',');
                }
                buffer.write_escape(key);
            }
            buffer.write_char(')');
        }

        buffer.write_char(' ');

        match action {
            ConflictAction::Ignore => match self_assigned {
                Some(field) => {
                    buffer.write_str(self.update_statement);
                    buffer.write_char(' ');
                    buffer.write_escape(field);
                    buffer.write_char('=');
                    buffer.write_escape(field);
                }
                None => buffer.write_str(self.ignore_statement),
            },
            ConflictAction::Replace => {
                buffer.write_str(self.update_statement);
                buffer.write_char(' ');
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        buffer.write_char(',');
                    }
                    buffer.write_escape(field);
                    buffer.write_char('=');
                    if self.use_values {
                        buffer.write_str("VALUES(");
                        buffer.write_escape(field);
                        buffer.write_char(')');
                    } else {
                        buffer.write_field(self.table_qualifier, field);
                    }
                }
            }
            ConflictAction::Fragment { expr, args } => {
                buffer.write_str(expr);
                buffer.add_arguments(args.iter().cloned());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{BufferFactory, Quote};
    use crate::mutate::{set_all, Mutate};
    use crate::value::Value;

    fn render(builder: OnConflictBuilder, quote: Quote, on_conflict: &OnConflict) -> String {
        let mut buffer = BufferFactory::new(quote).create();
        let mutates = set_all([("name", Value::from("a")), ("id", Value::Int(1))]);
        builder.write_mutates(&mut buffer, &mutates, on_conflict).unwrap();
        buffer.into_parts().0
    }

    #[test]
    fn test_none_is_omitted() {
        assert_eq!(render(OnConflictBuilder::EXCLUDED, Quote::ANSI, &OnConflict::default()), "");
    }

    #[test]
    fn test_excluded_ignore() {
        assert_eq!(
            render(OnConflictBuilder::EXCLUDED, Quote::ANSI, &OnConflict::ignore(["id"])),
            " ON CONFLICT(\"id\") DO NOTHING"
        );
    }

    #[test]
    fn test_excluded_replace() {
        assert_eq!(
            render(OnConflictBuilder::EXCLUDED, Quote::ANSI, &OnConflict::replace(["id"])),
            " ON CONFLICT(\"id\") DO UPDATE SET \"id\"=\"excluded\".\"id\",\"name\"=\"excluded\".\"name\""
        );
    }

    #[test]
    fn test_duplicate_key_ignore_degrades_to_self_assignment() {
        assert_eq!(
            render(OnConflictBuilder::DUPLICATE_KEY, Quote::MYSQL, &OnConflict::ignore(["id"])),
            " ON DUPLICATE KEY UPDATE `id`=`id`"
        );
    }

    #[test]
    fn test_duplicate_key_replace_uses_values() {
        assert_eq!(
            render(OnConflictBuilder::DUPLICATE_KEY, Quote::MYSQL, &OnConflict::replace(["id"])),
            " ON DUPLICATE KEY UPDATE `id`=VALUES(`id`),`name`=VALUES(`name`)"
        );
    }

    #[test]
    fn test_fragment_binds_arguments() {
        let mut buffer = BufferFactory::new(Quote::ANSI).create();
        let oc = OnConflict::fragment("DO UPDATE SET hits = hits + ?", vec![Value::Int(1)]);
        OnConflictBuilder::EXCLUDED.write(&mut buffer, &[], &oc).unwrap();
        let (sql, args) = buffer.into_parts();
        assert_eq!(sql, " ON CONFLICT DO UPDATE SET hits = hits + ?");
        assert_eq!(args, vec![Value::Int(1)]);
    }

    // ── Degenerate inputs ────────────────────────────────────────────

    fn render_with(
        builder: OnConflictBuilder,
        quote: Quote,
        mutates: &Mutates,
        on_conflict: &OnConflict,
    ) -> RelResult<String> {
        let mut buffer = BufferFactory::new(quote).create();
        builder.write_mutates(&mut buffer, mutates, on_conflict)?;
        Ok(buffer.into_parts().0)
    }

    #[test]
    fn test_replace_without_fields_becomes_ignore() {
        let cases = [
            (OnConflictBuilder::EXCLUDED, Quote::ANSI, " ON CONFLICT(\"id\") DO NOTHING"),
            (OnConflictBuilder::DUPLICATE_KEY, Quote::MYSQL, " ON DUPLICATE KEY UPDATE `id`=`id`"),
        ];
        for (builder, quote, expected) in cases {
            let sql = render_with(builder, quote, &Mutates::new(), &OnConflict::replace(["id"]));
            assert_eq!(sql.unwrap(), expected);
        }
    }

    #[test]
    fn test_replace_only_overwrites_inserted_fields() {
        let mut mutates = set_all([("name", Value::from("a"))]);
        mutates.insert("hits".into(), Mutate::inc(1));
        mutates.insert("score=score*2".into(), Mutate::fragment(vec![]));

        let sql = render_with(
            OnConflictBuilder::EXCLUDED,
            Quote::ANSI,
            &mutates,
            &OnConflict::replace(["id"]),
        );
        assert_eq!(
            sql.unwrap(),
            " ON CONFLICT(\"id\") DO UPDATE SET \"name\"=\"excluded\".\"name\""
        );

        let mut inc_only = Mutates::new();
        inc_only.insert("n".into(), Mutate::inc(1));
        let sql = render_with(
            OnConflictBuilder::EXCLUDED,
            Quote::ANSI,
            &inc_only,
            &OnConflict::replace(["id"]),
        );
        assert_eq!(sql.unwrap(), " ON CONFLICT(\"id\") DO NOTHING");
    }

    #[test]
    fn test_duplicate_key_ignore_falls_back_to_conflict_key() {
        let sql = render_with(
            OnConflictBuilder::DUPLICATE_KEY,
            Quote::MYSQL,
            &Mutates::new(),
            &OnConflict::ignore(["email"]),
        );
        assert_eq!(sql.unwrap(), " ON DUPLICATE KEY UPDATE `email`=`email`");
    }

    #[test]
    fn test_duplicate_key_ignore_with_nothing_to_assign_is_rejected() {
        let err = render_with(
            OnConflictBuilder::DUPLICATE_KEY,
            Quote::MYSQL,
            &Mutates::new(),
            &OnConflict::ignore(Vec::<String>::new()),
        )
        .unwrap_err();
        assert!(matches!(err, RelError::InvalidQuery(_)));
    }
}
