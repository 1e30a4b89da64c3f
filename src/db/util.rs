// Query builders for the tables behind each collection.

#[derive(Debug, Clone)]
pub struct ColumnMapper {
  pub name: String,
  pub column: String,
}

pub fn column(name: &'static str) -> ColumnMapper {
  ColumnMapper {
    name: name.to_string(),
    column: name.to_string(),
  }
}

#[derive(Debug, Default, Clone)]
pub struct ColumnMappers {
  pub table_name: &'static str,
  pub columns: Vec<ColumnMapper>,
}

impl ColumnMappers {
  pub fn get_columns(&self) -> String {
    self.columns.iter()
      .map(|col| col.column.as_str())
      .collect::<Vec<_>>()
      .join(", ")
  }

  fn get_placeholders(&self) -> String {
    (1..=self.columns.len())
      .map(|idx| format!("${}", idx))
      .collect::<Vec<_>>()
      .join(", ")
  }

  pub fn build_select_query(&self) -> String {
    format!("SELECT {} FROM {}", self.get_columns(), self.table_name)
  }

  pub fn build_insert_query(&self) -> String {
    format!("INSERT INTO {}({}) VALUES({})",
      self.table_name, self.get_columns(), self.get_placeholders())
  }

  /// Insert, or overwrite every non-key column on conflict.
  pub fn build_upsert(&self, on_conflict: &str) -> String {
    let keys: Vec<&str> = on_conflict
      .trim_matches(|c| c == '(' || c == ')')
      .split(',')
      .map(str::trim)
      .collect();
    let updates = self.columns.iter()
      .filter(|col| !keys.contains(&col.name.as_str()))
      .map(|col| format!("{} = EXCLUDED.{}", col.column, col.column))
      .collect::<Vec<_>>()
      .join(", ");
    format!("{} ON CONFLICT {} DO UPDATE SET {}",
      self.build_insert_query(), on_conflict, updates)
  }
}
