use std::iter::Peekable;
use std::vec::IntoIter;
use crate::sql::parser::ast::{AggregateFunction, Operator, Predicate, PredicateGroup, Projection, Statement};
use crate::sql::parser::lexer::{Keyword, Lexer, Token};
use crate::utils::custom_error::{FlatDBError, FlatDBResult};

// select 至少需要 select <列> from <表> 四个token
const MIN_SELECT_TOKENS: usize = 4;

pub struct Parser<'a> {
    input: &'a str,
    tokens: Peekable<IntoIter<Token>>,
}

impl<'a> Parser<'a> {
    pub fn new(input: &'a str) -> Self {
        Parser {
            input,
            tokens: Vec::new().into_iter().peekable(),
        }
    }

    // 解析，获取到抽象语法树
    pub fn parse(&mut self) -> FlatDBResult<Statement> {
        let mut tokens = Lexer::new(self.input).collect::<FlatDBResult<Vec<_>>>()?;
        // 去掉结尾的分号
        if tokens.last() == Some(&Token::Semicolon) {
            tokens.pop();
        }
        let kind = Self::classify(&tokens);
        let count = tokens.len();
        self.tokens = tokens.into_iter().peekable();
        let stmt = match kind {
            Keyword::Create => self.parse_create()?,
            Keyword::Insert => self.parse_insert()?,
            Keyword::Delete => self.parse_delete()?,
            Keyword::Truncate => self.parse_truncate()?,
            Keyword::Drop => self.parse_drop()?,
            _ => {
                if count < MIN_SELECT_TOKENS {
                    return Err(FlatDBError::Parser(
                        "[Parser] Expected SELECT <columns> FROM <tables>".to_string(),
                    ));
                }
                self.parse_select()?
            }
        };
        // 语句之后不能存在其他Token
        if let Some(token) = self.custom_peek() {
            return Err(FlatDBError::Parser(format!("[Parser] Unexpected token: {}", token)));
        }
        Ok(stmt)
    }

    // 按关键字是否出现来判断语句类型，优先级 CREATE, INSERT, DELETE, TRUNCATE, DROP, 其余都当作 SELECT
    fn classify(tokens: &[Token]) -> Keyword {
        [Keyword::Create, Keyword::Insert, Keyword::Delete, Keyword::Truncate, Keyword::Drop]
            .into_iter()
            .find(|k| tokens.contains(&Token::Keyword(k.clone())))
            .unwrap_or(Keyword::Select)
    }

    // CREATE [TABLE] name (col1, col2, ...)
    fn parse_create(&mut self) -> FlatDBResult<Statement> {
        self.next_expect(Token::Keyword(Keyword::Create))?;
        self.next_if_token(Token::Keyword(Keyword::Table));
        let table_name = self.next_ident()?;
        self.next_expect(Token::LeftParen)?;
        let mut columns: Vec<String> = vec![];
        loop {
            let column = self.next_ident()?;
            if columns.contains(&column) {
                return Err(FlatDBError::Parser(format!("[Parser] Duplicate column {} for create", column)));
            }
            columns.push(column);
            // 允许在列名后写 int 类型，所有列都是整数
            self.next_if(|t| matches!(t, Token::Identifier(i) if i == "int" || i == "integer"));
            if self.next_if_token(Token::Comma).is_none() {
                break;
            }
        }
        self.next_expect(Token::RightParen)?;
        Ok(Statement::Create { table_name, columns })
    }

    // INSERT INTO name VALUES (v1, v2, ...)
    fn parse_insert(&mut self) -> FlatDBResult<Statement> {
        self.next_expect(Token::Keyword(Keyword::Insert))?;
        self.next_expect(Token::Keyword(Keyword::Into))?;
        let table_name = self.next_ident()?;
        self.next_expect(Token::Keyword(Keyword::Values))?;
        let parenthesized = self.next_if_token(Token::LeftParen).is_some();
        let mut values = vec![];
        loop {
            values.push(self.parse_raw_literal()?);
            if self.next_if_token(Token::Comma).is_none() {
                break;
            }
        }
        if parenthesized {
            self.next_expect(Token::RightParen)?;
        }
        Ok(Statement::Insert { table_name, values })
    }

    // insert 的值保持原样，不做类型转换
    fn parse_raw_literal(&mut self) -> FlatDBResult<String> {
        let literal = match self.custom_next()? {
            Token::Number(n) => n,
            Token::Minus => match self.custom_next()? {
                Token::Number(n) => format!("-{}", n),
                token => return Err(FlatDBError::Parser(format!("[Parser] Expected number after -, got {}", token))),
            },
            Token::String(s) => s,
            Token::Identifier(ident) => ident,
            token => return Err(FlatDBError::Parser(format!("[Parser] Unexpected value token: {}", token))),
        };
        if literal.contains(',') || literal.contains('\n') {
            return Err(FlatDBError::Parser(format!("[Parser] Value {:?} may not contain a comma or newline", literal)));
        }
        Ok(literal)
    }

    // DELETE [FROM] name WHERE field op value
    fn parse_delete(&mut self) -> FlatDBResult<Statement> {
        self.next_expect(Token::Keyword(Keyword::Delete))?;
        self.next_if_token(Token::Keyword(Keyword::From));
        let table_name = self.next_ident()?;
        self.next_expect(Token::Keyword(Keyword::Where))?;
        let predicate = self.parse_predicate()?;
        if self.next_if(|t| matches!(t, Token::Keyword(Keyword::And) | Token::Keyword(Keyword::Or))).is_some() {
            return Err(FlatDBError::Parser("[Parser] DELETE supports exactly one predicate".to_string()));
        }
        Ok(Statement::Delete { table_name, predicate })
    }

    fn parse_truncate(&mut self) -> FlatDBResult<Statement> {
        self.next_expect(Token::Keyword(Keyword::Truncate))?;
        self.next_if_token(Token::Keyword(Keyword::Table));
        Ok(Statement::Truncate { table_name: self.next_ident()? })
    }

    fn parse_drop(&mut self) -> FlatDBResult<Statement> {
        self.next_expect(Token::Keyword(Keyword::Drop))?;
        self.next_if_token(Token::Keyword(Keyword::Table));
        Ok(Statement::Drop { table_name: self.next_ident()? })
    }

    // SELECT projection FROM t1, t2 [WHERE ...]
    fn parse_select(&mut self) -> FlatDBResult<Statement> {
        self.next_expect(Token::Keyword(Keyword::Select))?;
        let projection = self.parse_projection()?;
        self.next_expect(Token::Keyword(Keyword::From))?;
        let mut tables = vec![];
        loop {
            tables.push(self.next_ident()?);
            if self.next_if_token(Token::Comma).is_none() {
                break;
            }
        }
        Ok(Statement::Select {
            projection,
            tables,
            predicates: self.parse_where_clause()?,
        })
    }

    // 解析查询的列信息
    fn parse_projection(&mut self) -> FlatDBResult<Projection> {
        if self.next_if_token(Token::Star).is_some() {
            return Ok(Projection::Wildcard);
        }
        let mut columns = vec![];
        loop {
            let ident = self.next_ident()?;
            // 解析函数
            if self.next_if_token(Token::LeftParen).is_some() {
                let function = AggregateFunction::from_str(&ident)?;
                let field = self.next_ident()?;
                self.next_expect(Token::RightParen)?;
                if !columns.is_empty() || self.custom_peek() == Some(Token::Comma) {
                    return Err(FlatDBError::Parser(
                        "[Parser] An aggregate function must be the only select item".to_string(),
                    ));
                }
                return Ok(Projection::Aggregate { function, field });
            }
            columns.push(ident);
            if self.next_if_token(Token::Comma).is_none() {
                break;
            }
        }
        Ok(Projection::Columns(columns))
    }

    // 解析where子句，最多两个条件
    fn parse_where_clause(&mut self) -> FlatDBResult<Option<PredicateGroup>> {
        if self.next_if_token(Token::Keyword(Keyword::Where)).is_none() {
            return Ok(None);
        }
        let first = self.parse_predicate()?;
        let group = match self.next_if(|t| matches!(t, Token::Keyword(Keyword::And) | Token::Keyword(Keyword::Or))) {
            Some(Token::Keyword(Keyword::And)) => PredicateGroup::And(first, self.parse_predicate()?),
            Some(_) => PredicateGroup::Or(first, self.parse_predicate()?),
            None => return Ok(Some(PredicateGroup::Single(first))),
        };
        if self.next_if(|t| matches!(t, Token::Keyword(Keyword::And) | Token::Keyword(Keyword::Or))).is_some() {
            return Err(FlatDBError::Parser("[Parser] At most two predicates are supported".to_string()));
        }
        Ok(Some(group))
    }

    // field op value
    fn parse_predicate(&mut self) -> FlatDBResult<Predicate> {
        let field = self.next_ident()?;
        let operator = match self.custom_next()? {
            Token::Equal => Operator::Equal,
            Token::GreaterThan => Operator::GreaterThan,
            Token::LessThan => Operator::LessThan,
            token => return Err(FlatDBError::Parser(format!("[Parser] Unsupported operator {}", token))),
        };
        let value = self.parse_integer(operator)?;
        Ok(Predicate::new(field, operator, value))
    }

    fn parse_integer(&mut self, operator: Operator) -> FlatDBResult<i64> {
        let (negative, token) = match self.custom_next()? {
            Token::Minus => (true, self.custom_next()?),
            token => (false, token),
        };
        match token {
            Token::Number(n) => {
                let literal = if negative { format!("-{}", n) } else { n };
                literal
                    .parse::<i64>()
                    .map_err(|_| FlatDBError::Value(format!("{} is not an integer", literal)))
            }
            // >= <= == 这类组合操作符不支持
            Token::Equal | Token::GreaterThan | Token::LessThan => Err(FlatDBError::Parser(format!(
                "[Parser] Unsupported operator {}{}",
                operator, token
            ))),
            Token::String(s) | Token::Identifier(s) => Err(FlatDBError::Value(format!("{} is not an integer", s))),
            token => Err(FlatDBError::Parser(format!("[Parser] Expected integer, got {}", token))),
        }
    }

    fn custom_peek(&mut self) -> Option<Token> {
        self.tokens.peek().cloned()
    }

    fn custom_next(&mut self) -> FlatDBResult<Token> {
        self.tokens
            .next()
            .ok_or_else(|| FlatDBError::Parser("[Parser] Unexpected end of input".to_string()))
    }

    fn next_ident(&mut self) -> FlatDBResult<String> {
        match self.custom_next()? {
            Token::Identifier(ident) => Ok(ident),
            token => Err(FlatDBError::Parser(format!("[Parser] Expected identifier, got {}", token))),
        }
    }

    fn next_expect(&mut self, expected: Token) -> FlatDBResult<()> {
        match self.custom_next()? {
            token if token == expected => Ok(()),
            token => Err(FlatDBError::Parser(format!("[Parser] Expected token: {}, got {}", expected, token))),
        }
    }

    // 如果满足条件，则跳转到下一个Token，否则返回None
    fn next_if<F: Fn(&Token) -> bool>(&mut self, predicate: F) -> Option<Token> {
        self.tokens.next_if(|t| predicate(t))
    }

    fn next_if_token(&mut self, token: Token) -> Option<Token> {
        self.next_if(|t| t == &token)
    }
}

#[cfg(test)]
mod tests {
    use super::Parser;
    use crate::sql::parser::ast::{AggregateFunction, Operator, Predicate, PredicateGroup, Projection, Statement};
    use crate::utils::custom_error::{FlatDBError, FlatDBResult};

    fn names(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_parser_create_table() -> FlatDBResult<()> {
        let stmt1 = Parser::new("create table tbl1 (a, b, c);").parse()?;
        let stmt2 = Parser::new("CREATE   tbl1 (  a int,B,c  )").parse()?;
        assert_eq!(stmt1, stmt2);
        assert_eq!(
            stmt1,
            Statement::Create { table_name: "tbl1".to_string(), columns: names(&["a", "b", "c"]) }
        );

        assert!(Parser::new("create tbl1 (a, a);").parse().is_err());
        assert!(Parser::new("create tbl1 a, b;").parse().is_err());
        assert!(Parser::new("create tbl1 ();").parse().is_err());
        Ok(())
    }

    #[test]
    fn test_parser_insert() -> FlatDBResult<()> {
        let stmt = Parser::new("insert into tbl1 values (1, -2, abc, '4');").parse()?;
        assert_eq!(
            stmt,
            Statement::Insert { table_name: "tbl1".to_string(), values: names(&["1", "-2", "abc", "4"]) }
        );
        assert!(Parser::new("insert into values (1);").parse().is_err());
        assert!(Parser::new("insert into t (1);").parse().is_err());
        Ok(())
    }

    #[test]
    fn test_parser_select() -> FlatDBResult<()> {
        assert_eq!(
            Parser::new("select * from t1, t2;").parse()?,
            Statement::Select {
                projection: Projection::Wildcard,
                tables: names(&["t1", "t2"]),
                predicates: None,
            }
        );
        assert_eq!(
            Parser::new("SELECT a, b FROM t WHERE a = -1 AND b > 3").parse()?,
            Statement::Select {
                projection: Projection::Columns(names(&["a", "b"])),
                tables: names(&["t"]),
                predicates: Some(PredicateGroup::And(
                    Predicate::new("a", Operator::Equal, -1),
                    Predicate::new("b", Operator::GreaterThan, 3),
                )),
            }
        );
        assert_eq!(
            Parser::new("select avg(a) from t where a<5 or c=2;").parse()?,
            Statement::Select {
                projection: Projection::Aggregate { function: AggregateFunction::Avg, field: "a".to_string() },
                tables: names(&["t"]),
                predicates: Some(PredicateGroup::Or(
                    Predicate::new("a", Operator::LessThan, 5),
                    Predicate::new("c", Operator::Equal, 2),
                )),
            }
        );
        Ok(())
    }

    #[test]
    fn test_parser_select_errors() {
        let parse_errors = [
            "select a from",
            "select from t",
            "select * from t where a = 1 and b = 2 or c = 3",
            "select * from t where a >= 1",
            "select * from t where a != 1",
            "select * from t where a",
            "select median(a) from t",
            "select max(a), b from t",
            "select b, max(a) from t",
            "select * from t; select * from u",
        ];
        for sql in parse_errors {
            assert!(matches!(Parser::new(sql).parse(), Err(FlatDBError::Parser(_))), "{}", sql);
        }
        let value_errors = ["select * from t where a = 1.5", "select * from t where a = 'x'", "select * from t where a = b"];
        for sql in value_errors {
            assert!(matches!(Parser::new(sql).parse(), Err(FlatDBError::Value(_))), "{}", sql);
        }
    }

    #[test]
    fn test_parser_delete() -> FlatDBResult<()> {
        assert_eq!(
            Parser::new("delete from t where a > 3;").parse()?,
            Statement::Delete { table_name: "t".to_string(), predicate: Predicate::new("a", Operator::GreaterThan, 3) }
        );
        assert_eq!(
            Parser::new("delete t where a=3").parse()?,
            Statement::Delete { table_name: "t".to_string(), predicate: Predicate::new("a", Operator::Equal, 3) }
        );
        assert!(Parser::new("delete from t;").parse().is_err());
        assert!(Parser::new("delete from t where a=1 and b=2;").parse().is_err());
        Ok(())
    }

    #[test]
    fn test_parser_truncate_drop() -> FlatDBResult<()> {
        assert_eq!(Parser::new("truncate t;").parse()?, Statement::Truncate { table_name: "t".to_string() });
        assert_eq!(Parser::new("TRUNCATE TABLE t").parse()?, Statement::Truncate { table_name: "t".to_string() });
        assert_eq!(Parser::new("drop t;").parse()?, Statement::Drop { table_name: "t".to_string() });
        assert!(Parser::new("drop;").parse().is_err());
        Ok(())
    }

    #[test]
    fn test_parser_keyword_priority() {
        // 出现 DROP 关键字就按 DROP 解析
        assert!(Parser::new("select * from t where drop = 1").parse().is_err());
    }
}
