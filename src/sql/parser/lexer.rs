// 词法分析 Lexer 定义
// 目前支持的 SQL 语法

use std::fmt::{Display, Formatter};
use std::iter::Peekable;
use std::str::Chars;
use crate::utils::custom_error::{FlatDBError, FlatDBResult};

#[derive(Debug, Clone, PartialEq)]
pub enum Keyword {
    Create,
    Table,
    Select,
    From,
    Where,
    Insert,
    Into,
    Values,
    Delete,
    Truncate,
    Drop,
    And,
    Or,
}

impl Keyword {
    pub fn from_str(ident: &str) -> Option<Self> {
        match ident.to_uppercase().as_ref() {
            "CREATE" => Some(Keyword::Create),
            "TABLE" => Some(Keyword::Table),
            "SELECT" => Some(Keyword::Select),
            "FROM" => Some(Keyword::From),
            "WHERE" => Some(Keyword::Where),
            "INSERT" => Some(Keyword::Insert),
            "INTO" => Some(Keyword::Into),
            "VALUES" => Some(Keyword::Values),
            "DELETE" => Some(Keyword::Delete),
            "TRUNCATE" => Some(Keyword::Truncate),
            "DROP" => Some(Keyword::Drop),
            "AND" => Some(Keyword::And),
            "OR" => Some(Keyword::Or),
            _ => None,
        }
    }

    pub fn to_str(&self) -> &str {
        match self {
            Keyword::Create => "CREATE",
            Keyword::Table => "TABLE",
            Keyword::Select => "SELECT",
            Keyword::From => "FROM",
            Keyword::Where => "WHERE",
            Keyword::Insert => "INSERT",
            Keyword::Into => "INTO",
            Keyword::Values => "VALUES",
            Keyword::Delete => "DELETE",
            Keyword::Truncate => "TRUNCATE",
            Keyword::Drop => "DROP",
            Keyword::And => "AND",
            Keyword::Or => "OR",
        }
    }
}

impl Display for Keyword {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.to_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // 关键字
    Keyword(Keyword),
    // 标识符
    Identifier(String),
    // 数字
    Number(String),
    // 字符串
    String(String),
    // 左括号
    LeftParen,
    // 右括号
    RightParen,
    // 逗号
    Comma,
    // 分号
    Semicolon,
    // 星号
    Star,
    // 减号
    Minus,
    // 点号
    Dot,
    // 等号
    Equal,
    // 大于号
    GreaterThan,
    // 小于号
    LessThan,
    // 不等于号
    NotEqual,
}

impl Display for Token {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Token::Keyword(keyword) => keyword.to_str(),
            Token::Identifier(ident) => ident,
            Token::Number(num) => num,
            Token::String(string) => string,
            Token::LeftParen => "(",
            Token::RightParen => ")",
            Token::Comma => ",",
            Token::Semicolon => ";",
            Token::Star => "*",
            Token::Minus => "-",
            Token::Dot => ".",
            Token::Equal => "=",
            Token::GreaterThan => ">",
            Token::LessThan => "<",
            Token::NotEqual => "!=",
        })
    }
}

// 1. Select
// -------------------------------------
// SELECT * | col [, ...] | func(col) FROM table [, ...]
// [ WHERE col op int [ AND | OR col op int ] ];
//
// 2. Create
// -------------------------------------
// CREATE [TABLE] table_name ( column_name [, ...] );
//
// 3. Insert Into
// -------------------------------------
// INSERT INTO table_name VALUES ( value [, ...] );
//
// 4. Delete / Truncate / Drop
// -------------------------------------
// DELETE FROM table_name WHERE col op int;
// TRUNCATE table_name;
// DROP table_name;
pub struct Lexer<'a> {
    iter: Peekable<Chars<'a>>,
}

impl<'a> Iterator for Lexer<'a> {
    type Item = FlatDBResult<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.scan() {
            Ok(Some(token)) => Some(Ok(token)),
            Ok(None) => self
                .iter
                .next()
                .map(|c| Err(FlatDBError::Parser(format!("[Lexer] Unexpected character {}", c)))),
            Err(e) => Some(Err(e)),
        }
    }
}

impl<'a> Lexer<'a> {
    pub fn new(sql: &'a str) -> Lexer<'a> {
        Lexer {
            iter: sql.chars().peekable(),
        }
    }

    /// 消除空白字符
    /// ex： select    *     from   table
    fn skip_whitespace(&mut self) {
        self.next_while(|c| c.is_whitespace());
    }

    fn next_if<F: Fn(char) -> bool>(&mut self, predicate: F) -> Option<char> {
        self.iter.peek().filter(|&c| predicate(*c))?;
        self.iter.next()
    }

    fn next_while<F: Fn(char) -> bool>(&mut self, predicate: F) -> Option<String> {
        let mut value = String::new();
        while let Some(c) = self.next_if(&predicate) {
            value.push(c);
        }
        Some(value).filter(|s| !s.is_empty())
    }

    fn next_if_token<F: Fn(char) -> Option<Token>>(&mut self, predicate: F) -> Option<Token> {
        let token = self.iter.peek().and_then(|c| predicate(*c))?;
        self.iter.next();
        Some(token)
    }

    // 词法分析
    pub fn scan(&mut self) -> FlatDBResult<Option<Token>> {
        self.skip_whitespace();
        // 根据第一个字符判断
        match self.iter.peek() {
            Some('\'') | Some('"') => self.scan_string(),
            Some(c) if c.is_ascii_digit() => Ok(self.scan_number()),
            Some(c) if c.is_alphabetic() || *c == '_' => Ok(self.scan_identifier()),
            Some(_) => Ok(self.scan_symbol()),
            None => Ok(None),
        }
    }

    /// 扫描单引号或双引号包围的字符串
    fn scan_string(&mut self) -> FlatDBResult<Option<Token>> {
        let quote = match self.next_if(|c| c == '\'' || c == '"') {
            Some(q) => q,
            None => return Ok(None),
        };
        let mut value = String::new();
        loop {
            match self.iter.next() {
                Some(c) if c == quote => break,
                Some(c) => value.push(c),
                None => return Err(FlatDBError::Parser("[Lexer] Unterminated string".to_string())),
            }
        }
        Ok(Some(Token::String(value)))
    }

    /// 扫描数字
    fn scan_number(&mut self) -> Option<Token> {
        let mut num = self.next_while(|c| c.is_ascii_digit())?;
        // 如果中间存在小数点，说明是浮点数
        if let Some(sep) = self.next_if(|c| c == '.') {
            num.push(sep);
            while let Some(c) = self.next_if(|c| c.is_ascii_digit()) {
                num.push(c);
            }
        }
        Some(Token::Number(num))
    }

    // 扫描identifier类型，比如表名，字段名
    fn scan_identifier(&mut self) -> Option<Token> {
        let value = self.next_while(|c| c.is_alphanumeric() || c == '_')?;
        Some(Keyword::from_str(&value).map_or(Token::Identifier(value.to_lowercase()), Token::Keyword))
    }

    //扫描符号
    fn scan_symbol(&mut self) -> Option<Token> {
        let token = self.next_if_token(|c| match c {
            '*' => Some(Token::Star),
            '-' => Some(Token::Minus),
            '=' => Some(Token::Equal),
            '>' => Some(Token::GreaterThan),
            '<' => Some(Token::LessThan),
            '!' => Some(Token::NotEqual),
            '(' => Some(Token::LeftParen),
            ')' => Some(Token::RightParen),
            ',' => Some(Token::Comma),
            ';' => Some(Token::Semicolon),
            '.' => Some(Token::Dot),
            _ => None,
        })?;
        // != 作为一个整体
        if token == Token::NotEqual {
            self.next_if(|c| c == '=');
        }
        Some(token)
    }
}
