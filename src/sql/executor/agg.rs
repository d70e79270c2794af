use crate::sql::engine::Store;
use crate::sql::executor::{AggregateResult, AggregateValue, Executor, ResultSet};
use crate::sql::parser::ast::AggregateFunction;
use crate::sql::schema::Database;
use crate::sql::types::Value;
use crate::utils::custom_error::{FlatDBError, FlatDBResult};

// 聚合：每张包含该字段的表计算出一个值，不包含该字段的表从结果中去掉
pub struct AggregateExecutor<S: Store> {
    source: Box<dyn Executor<S>>,
    function: AggregateFunction,
    field: String,
}

impl<S: Store> AggregateExecutor<S> {
    pub fn new(source: Box<dyn Executor<S>>, function: AggregateFunction, field: String) -> Box<Self> {
        Box::new(Self { source, function, field })
    }
}

impl<S: Store> Executor<S> for AggregateExecutor<S> {
    fn execute(self: Box<Self>, db: &Database, store: &mut S) -> FlatDBResult<ResultSet> {
        if let ResultSet::Select { tables } = self.source.execute(db, store)? {
            let calculator = <dyn Calculator>::build(self.function);
            let mut results = Vec::new();
            for table in tables.iter() {
                if let Some(column) = table.get_column(&self.field) {
                    results.push(AggregateResult {
                        table_name: table.name.clone(),
                        value: calculator.calculate(&column.values)?,
                    });
                }
            }
            return Ok(ResultSet::Aggregate {
                function: self.function,
                field: self.field,
                results,
            });
        }
        Err(FlatDBError::Internal("Unexpected result set".to_string()))
    }
}

pub trait Calculator {
    fn calculate(&self, values: &[Value]) -> FlatDBResult<AggregateValue>;
}

impl dyn Calculator {
    pub fn build(function: AggregateFunction) -> Box<dyn Calculator> {
        match function {
            AggregateFunction::Count => Box::new(Count),
            AggregateFunction::Sum => Box::new(Sum),
            AggregateFunction::Avg => Box::new(Avg),
            AggregateFunction::Min => Box::new(Min),
            AggregateFunction::Max => Box::new(Max),
            AggregateFunction::Distinct => Box::new(Distinct),
        }
    }
}

pub struct Count;
pub struct Sum;
pub struct Avg;
pub struct Min;
pub struct Max;
pub struct Distinct;

// NULL 的时候跳过
fn integers(values: &[Value]) -> impl Iterator<Item = i64> + '_ {
    values.iter().filter_map(|v| v.as_integer())
}

impl Calculator for Count {
    fn calculate(&self, values: &[Value]) -> FlatDBResult<AggregateValue> {
        Ok(AggregateValue::Integer(integers(values).count() as i64))
    }
}

impl Calculator for Sum {
    fn calculate(&self, values: &[Value]) -> FlatDBResult<AggregateValue> {
        let sum = integers(values)
            .try_fold(0i64, |acc, v| acc.checked_add(v))
            .ok_or_else(|| FlatDBError::Value("sum overflows a 64-bit integer".to_string()))?;
        Ok(AggregateValue::Integer(sum))
    }
}

impl Calculator for Avg {
    fn calculate(&self, values: &[Value]) -> FlatDBResult<AggregateValue> {
        let (sum, count) = integers(values).fold((0f64, 0usize), |(sum, count), v| (sum + v as f64, count + 1));
        // 全为 NULL 时返回 NULL
        if count == 0 {
            return Ok(AggregateValue::Null);
        }
        Ok(AggregateValue::Float(sum / count as f64))
    }
}

impl Calculator for Min {
    fn calculate(&self, values: &[Value]) -> FlatDBResult<AggregateValue> {
        Ok(integers(values).min().map_or(AggregateValue::Null, AggregateValue::Integer))
    }
}

impl Calculator for Max {
    fn calculate(&self, values: &[Value]) -> FlatDBResult<AggregateValue> {
        Ok(integers(values).max().map_or(AggregateValue::Null, AggregateValue::Integer))
    }
}

// 按第一次出现的顺序去重，NULL 也算一个值
impl Calculator for Distinct {
    fn calculate(&self, values: &[Value]) -> FlatDBResult<AggregateValue> {
        let mut distinct = Vec::new();
        for value in values {
            if !distinct.contains(value) {
                distinct.push(*value);
            }
        }
        Ok(AggregateValue::Distinct(distinct))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::executor::query::Scan;
    use crate::sql::schema::{Column, Table};
    use crate::storage::file::FileStore;

    fn ints(values: &[i64]) -> Vec<Value> {
        values.iter().map(|v| Value::Integer(*v)).collect()
    }

    fn calculate(function: AggregateFunction, values: &[Value]) -> FlatDBResult<AggregateValue> {
        <dyn Calculator>::build(function).calculate(values)
    }

    #[test]
    fn test_calculators() -> FlatDBResult<()> {
        let values = ints(&[1, 2, 4]);
        assert_eq!(calculate(AggregateFunction::Max, &values)?, AggregateValue::Integer(4));
        assert_eq!(calculate(AggregateFunction::Min, &values)?, AggregateValue::Integer(1));
        assert_eq!(calculate(AggregateFunction::Sum, &values)?, AggregateValue::Integer(7));
        assert_eq!(calculate(AggregateFunction::Count, &values)?, AggregateValue::Integer(3));
        match calculate(AggregateFunction::Avg, &values)? {
            AggregateValue::Float(avg) => assert!((avg - 7.0 / 3.0).abs() < 1e-9),
            other => panic!("avg should be a float, got {:?}", other),
        }
        assert_eq!(
            calculate(AggregateFunction::Distinct, &ints(&[1, 1, 2]))?,
            AggregateValue::Distinct(ints(&[1, 2]))
        );
        Ok(())
    }

    #[test]
    fn test_avg_of_integers_is_float() -> FlatDBResult<()> {
        assert_eq!(calculate(AggregateFunction::Avg, &ints(&[2, 4]))?, AggregateValue::Float(3.0));
        Ok(())
    }

    #[test]
    fn test_calculators_skip_null() -> FlatDBResult<()> {
        let values = vec![Value::Null, Value::Integer(3), Value::Null];
        assert_eq!(calculate(AggregateFunction::Count, &values)?, AggregateValue::Integer(1));
        assert_eq!(calculate(AggregateFunction::Sum, &values)?, AggregateValue::Integer(3));
        assert_eq!(calculate(AggregateFunction::Max, &[Value::Null])?, AggregateValue::Null);
        assert_eq!(calculate(AggregateFunction::Avg, &[])?, AggregateValue::Null);
        assert_eq!(calculate(AggregateFunction::Sum, &[])?, AggregateValue::Integer(0));
        assert_eq!(
            calculate(AggregateFunction::Distinct, &values)?,
            AggregateValue::Distinct(vec![Value::Null, Value::Integer(3)])
        );
        Ok(())
    }

    #[test]
    fn test_sum_overflow() {
        let values = ints(&[i64::MAX, 1]);
        assert!(matches!(calculate(AggregateFunction::Sum, &values), Err(FlatDBError::Value(_))));
    }

    #[test]
    fn test_aggregate_executor_drops_tables_without_field() -> FlatDBResult<()> {
        let db = Database::new(vec![
            Table::new("t1", vec![Column::new("a", ints(&[1, 2, 4])), Column::new("b", ints(&[0, 0, 0]))]),
            Table::new("t2", vec![Column::new("b", ints(&[9]))]),
        ]);
        let mut store = FileStore::new("unused");
        let scan: Box<dyn Executor<FileStore>> = Scan::new(vec!["t1".to_string(), "t2".to_string()], None);
        let agg: Box<dyn Executor<FileStore>> = AggregateExecutor::new(scan, AggregateFunction::Max, "a".to_string());
        assert_eq!(
            agg.execute(&db, &mut store)?,
            ResultSet::Aggregate {
                function: AggregateFunction::Max,
                field: "a".to_string(),
                results: vec![AggregateResult { table_name: "t1".to_string(), value: AggregateValue::Integer(4) }],
            }
        );
        Ok(())
    }
}
