// where 条件过滤
//
// AND: 两个条件依次作用在同一张表上，表中没有该字段时跳过该条件
// OR:  每张表只取第一个该表包含的字段对应的条件进行过滤，两个字段都存在时取第一个，
//      并不是真正意义上同一张表内两个条件的并集

use crate::sql::parser::ast::{Operator, Predicate, PredicateGroup};
use crate::sql::schema::{Database, Table};
use crate::sql::types::Value;
use crate::utils::custom_error::{FlatDBError, FlatDBResult};

// NULL 与任何整数比较都不成立
fn satisfies(value: &Value, predicate: &Predicate) -> bool {
    match value {
        Value::Null => false,
        Value::Integer(v) => match predicate.operator {
            Operator::Equal => *v == predicate.value,
            Operator::GreaterThan => *v > predicate.value,
            Operator::LessThan => *v < predicate.value,
        },
    }
}

// 扫描一次条件字段所在的列，返回需要删除的行下标
pub fn rows_to_drop(table: &Table, predicate: &Predicate) -> Vec<usize> {
    match table.get_column(&predicate.field) {
        Some(column) => column
            .values
            .iter()
            .enumerate()
            .filter(|(_, v)| !satisfies(v, predicate))
            .map(|(i, _)| i)
            .collect(),
        None => Vec::new(),
    }
}

pub fn apply_predicate(table: &mut Table, predicate: &Predicate) {
    let indices = rows_to_drop(table, predicate);
    table.remove_rows(indices);
}

pub fn apply_group(db: &mut Database, group: &PredicateGroup) -> FlatDBResult<()> {
    // 没有匹配的表时不做任何处理
    if db.tables.is_empty() {
        return Ok(());
    }
    // 条件中的字段必须至少存在于一张表中，先校验再过滤
    for predicate in group.predicates() {
        if !db.tables.iter().any(|t| t.has_column(&predicate.field)) {
            return Err(FlatDBError::Schema(format!("column {} not found", predicate.field)));
        }
    }
    for table in db.tables.iter_mut() {
        match group {
            PredicateGroup::Single(p) => apply_predicate(table, p),
            PredicateGroup::And(p, q) => {
                apply_predicate(table, p);
                apply_predicate(table, q);
            }
            PredicateGroup::Or(p, q) => {
                if table.has_column(&p.field) {
                    apply_predicate(table, p);
                } else if table.has_column(&q.field) {
                    apply_predicate(table, q);
                }
            }
        }
    }
    Ok(())
}
