//! Table, column and key definitions.

use super::SchemaOp;
use crate::value::Value;

/// Semantic column types, mapped to native types by each dialect.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ColumnType {
    /// Auto-incrementing integer primary key.
    Id,
    /// Auto-incrementing big integer primary key.
    BigId,
    /// Boolean.
    Bool,
    /// Integer.
    Int,
    /// Big integer.
    BigInt,
    /// Floating point.
    Float,
    /// Fixed-point decimal.
    Decimal,
    /// Bounded string.
    String,
    /// Unbounded text.
    Text,
    /// JSON document.
    Json,
    /// Calendar date.
    Date,
    /// Date and time.
    DateTime,
    /// Time of day.
    Time,
    /// A native type name passed through unchanged.
    Raw(String),
}

/// A column definition, also used for ALTER TABLE column changes.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    /// Column name.
    pub name: String,
    /// Semantic type.
    pub kind: ColumnType,
    /// Operation when used inside ALTER TABLE.
    pub op: SchemaOp,
    /// New name for [`SchemaOp::Rename`].
    pub rename: String,
    /// Length limit (strings, texts, integers).
    pub limit: u32,
    /// Precision (floats, decimals).
    pub precision: u32,
    /// Scale (decimals).
    pub scale: u32,
    /// `UNSIGNED`
    pub unsigned: bool,
    /// `UNIQUE`
    pub unique: bool,
    /// `NOT NULL`
    pub required: bool,
    /// `PRIMARY KEY`
    pub primary: bool,
    /// `DEFAULT <value>`, inlined as a literal.
    pub default: Option<Value>,
    /// Raw trailing options.
    pub options: String,
}

impl Column {
    /// A column to be created.
    pub fn new(name: impl Into<String>, kind: ColumnType) -> Self {
        Self {
            name: name.into(),
            kind,
            op: SchemaOp::Create,
            rename: String::new(),
            limit: 0,
            precision: 0,
            scale: 0,
            unsigned: false,
            unique: false,
            required: false,
            primary: false,
            default: None,
            options: String::new(),
        }
    }

    /// Sets the length limit.
    pub fn limit(&mut self, limit: u32) -> &mut Self {
        self.limit = limit;
        self
    }

    /// Sets the precision.
    pub fn precision(&mut self, precision: u32) -> &mut Self {
        self.precision = precision;
        self
    }

    /// Sets the scale.
    pub fn scale(&mut self, scale: u32) -> &mut Self {
        self.scale = scale;
        self
    }

    /// Marks the column `UNSIGNED`.
    pub fn unsigned(&mut self) -> &mut Self {
        self.unsigned = true;
        self
    }

    /// Marks the column `UNIQUE`.
    pub fn unique(&mut self) -> &mut Self {
        self.unique = true;
        self
    }

    /// Marks the column `NOT NULL`.
    pub fn required(&mut self) -> &mut Self {
        self.required = true;
        self
    }

    /// Marks the column `PRIMARY KEY`.
    pub fn primary(&mut self) -> &mut Self {
        self.primary = true;
        self
    }

    /// Sets the default value.
    pub fn default(&mut self, value: impl Into<Value>) -> &mut Self {
        self.default = Some(value.into());
        self
    }

    /// Sets raw trailing options.
    pub fn options(&mut self, options: impl Into<String>) -> &mut Self {
        self.options = options.into();
        self
    }
}

/// Key constraint kinds.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeyType {
    /// `PRIMARY KEY`
    Primary,
    /// `UNIQUE`
    Unique,
    /// `FOREIGN KEY`
    Foreign,
    /// A raw constraint keyword.
    Raw(String),
}

impl KeyType {
    /// Returns the SQL keyword.
    pub fn as_sql(&self) -> &str {
        match self {
            Self::Primary => "PRIMARY KEY",
            Self::Unique => "UNIQUE",
            Self::Foreign => "FOREIGN KEY",
            Self::Raw(s) => s,
        }
    }
}

/// The referenced side of a foreign key.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ForeignKeyReference {
    /// Referenced table.
    pub table: String,
    /// Referenced columns.
    pub columns: Vec<String>,
    /// `ON DELETE` action, e.g. `CASCADE`.
    pub on_delete: String,
    /// `ON UPDATE` action.
    pub on_update: String,
}

/// A table-level key constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Key {
    /// Constraint name. May be empty.
    pub name: String,
    /// Constraint kind.
    pub kind: KeyType,
    /// Operation when used inside ALTER TABLE.
    pub op: SchemaOp,
    /// Covered columns.
    pub columns: Vec<String>,
    /// Referenced side for foreign keys.
    pub reference: ForeignKeyReference,
    /// Raw trailing options.
    pub options: String,
}

impl Key {
    /// A key to be created.
    pub fn new<S: Into<String>>(kind: KeyType, columns: impl IntoIterator<Item = S>) -> Self {
        Self {
            name: String::new(),
            kind,
            op: SchemaOp::Create,
            columns: columns.into_iter().map(Into::into).collect(),
            reference: ForeignKeyReference::default(),
            options: String::new(),
        }
    }

    /// Sets the constraint name.
    pub fn name(&mut self, name: impl Into<String>) -> &mut Self {
        self.name = name.into();
        self
    }

    /// Sets the `ON DELETE` action.
    pub fn on_delete(&mut self, action: impl Into<String>) -> &mut Self {
        self.reference.on_delete = action.into();
        self
    }

    /// Sets the `ON UPDATE` action.
    pub fn on_update(&mut self, action: impl Into<String>) -> &mut Self {
        self.reference.on_update = action.into();
        self
    }

    /// Sets raw trailing options.
    pub fn options(&mut self, options: impl Into<String>) -> &mut Self {
        self.options = options.into();
        self
    }
}

/// An entry inside a table definition.
#[derive(Debug, Clone, PartialEq)]
pub enum Definition {
    /// A column.
    Column(Column),
    /// A key constraint.
    Key(Key),
    /// Raw SQL.
    Raw(String),
}

/// A table-level schema change.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    /// Table name.
    pub name: String,
    /// The operation.
    pub op: SchemaOp,
    /// `IF NOT EXISTS` on create, `IF EXISTS` on drop.
    pub optional: bool,
    /// New name for [`SchemaOp::Rename`].
    pub rename: String,
    /// Columns, keys and raw definitions in order.
    pub definitions: Vec<Definition>,
    /// Raw trailing options, e.g. `ENGINE=InnoDB`.
    pub options: String,
}

impl Table {
    /// A table change with no definitions.
    pub fn new(name: impl Into<String>, op: SchemaOp) -> Self {
        Self {
            name: name.into(),
            op,
            optional: false,
            rename: String::new(),
            definitions: Vec::new(),
            options: String::new(),
        }
    }

    /// Sets raw trailing options.
    pub fn options(&mut self, options: impl Into<String>) -> &mut Self {
        self.options = options.into();
        self
    }

    /// Appends a column definition and returns it for further options.
    pub fn column(&mut self, name: impl Into<String>, kind: ColumnType) -> &mut Column {
        self.push_column(Column::new(name, kind))
    }

    fn push_column(&mut self, column: Column) -> &mut Column {
        self.definitions.push(Definition::Column(column));
        match self.definitions.last_mut() {
            Some(Definition::Column(column)) => column,
            _ => unreachable!("a column was just pushed"),
        }
    }

    fn push_key(&mut self, key: Key) -> &mut Key {
        self.definitions.push(Definition::Key(key));
        match self.definitions.last_mut() {
            Some(Definition::Key(key)) => key,
            _ => unreachable!("a key was just pushed"),
        }
    }

    /// `ID` primary key column.
    pub fn id(&mut self, name: impl Into<String>) -> &mut Column {
        self.column(name, ColumnType::Id).primary()
    }

    /// `BigID` primary key column.
    pub fn big_id(&mut self, name: impl Into<String>) -> &mut Column {
        self.column(name, ColumnType::BigId).primary()
    }

    /// Boolean column.
    pub fn bool(&mut self, name: impl Into<String>) -> &mut Column {
        self.column(name, ColumnType::Bool)
    }

    /// Integer column.
    pub fn int(&mut self, name: impl Into<String>) -> &mut Column {
        self.column(name, ColumnType::Int)
    }

    /// Big integer column.
    pub fn big_int(&mut self, name: impl Into<String>) -> &mut Column {
        self.column(name, ColumnType::BigInt)
    }

    /// Float column.
    pub fn float(&mut self, name: impl Into<String>) -> &mut Column {
        self.column(name, ColumnType::Float)
    }

    /// Decimal column.
    pub fn decimal(&mut self, name: impl Into<String>) -> &mut Column {
        self.column(name, ColumnType::Decimal)
    }

    /// String column.
    pub fn string(&mut self, name: impl Into<String>) -> &mut Column {
        self.column(name, ColumnType::String)
    }

    /// Text column.
    pub fn text(&mut self, name: impl Into<String>) -> &mut Column {
        self.column(name, ColumnType::Text)
    }

    /// JSON column.
    pub fn json(&mut self, name: impl Into<String>) -> &mut Column {
        self.column(name, ColumnType::Json)
    }

    /// Date column.
    pub fn date(&mut self, name: impl Into<String>) -> &mut Column {
        self.column(name, ColumnType::Date)
    }

    /// Date-time column.
    pub fn date_time(&mut self, name: impl Into<String>) -> &mut Column {
        self.column(name, ColumnType::DateTime)
    }

    /// Time column.
    pub fn time(&mut self, name: impl Into<String>) -> &mut Column {
        self.column(name, ColumnType::Time)
    }

    /// Renames a column (ALTER TABLE only).
    pub fn rename_column(
        &mut self,
        name: impl Into<String>,
        new_name: impl Into<String>,
    ) -> &mut Column {
        let mut column = Column::new(name, ColumnType::Raw(String::new()));
        column.op = SchemaOp::Rename;
        column.rename = new_name.into();
        self.push_column(column)
    }

    /// Drops a column (ALTER TABLE only).
    pub fn drop_column(&mut self, name: impl Into<String>) -> &mut Column {
        let mut column = Column::new(name, ColumnType::Raw(String::new()));
        column.op = SchemaOp::Drop;
        self.push_column(column)
    }

    /// Table-level primary key.
    pub fn primary_key<S: Into<String>>(&mut self, columns: impl IntoIterator<Item = S>) -> &mut Key {
        self.push_key(Key::new(KeyType::Primary, columns))
    }

    /// Table-level unique key.
    pub fn unique<S: Into<String>>(&mut self, columns: impl IntoIterator<Item = S>) -> &mut Key {
        self.push_key(Key::new(KeyType::Unique, columns))
    }

    /// Foreign key from `column` to `ref_table(ref_column)`.
    pub fn foreign_key(
        &mut self,
        column: impl Into<String>,
        ref_table: impl Into<String>,
        ref_column: impl Into<String>,
    ) -> &mut Key {
        let mut key = Key::new(KeyType::Foreign, [column.into()]);
        key.reference.table = ref_table.into();
        key.reference.columns = vec![ref_column.into()];
        self.push_key(key)
    }

    /// Raw definition.
    pub fn fragment(&mut self, sql: impl Into<String>) {
        self.definitions.push(Definition::Raw(sql.into()));
    }
}
