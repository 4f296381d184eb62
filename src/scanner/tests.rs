#[cfg(test)]
mod scanner_tests {
    use crate::scanner::token::{Token, TokenKind};
    use crate::scanner::Scanner;

    /// Scan the whole source, including the EOF sentinel.
    fn scan_all(source: &str) -> Vec<Token<'_>> {
        let mut scanner = Scanner::new(source);
        let mut tokens = Vec::new();
        loop {
            let token = scanner.scan_token();
            let done = token.kind == TokenKind::Eof;
            tokens.push(token);
            if done {
                break;
            }
        }
        tokens
    }

    fn scan_kinds(source: &str) -> Vec<TokenKind> {
        scan_all(source).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn empty_input() {
        assert_eq!(scan_kinds(""), vec![TokenKind::Eof]);
    }

    #[test]
    fn eof_repeats_forever() {
        let mut scanner = Scanner::new("");
        assert_eq!(scanner.scan_token().kind, TokenKind::Eof);
        assert_eq!(scanner.scan_token().kind, TokenKind::Eof);
        assert_eq!(scanner.scan_token().kind, TokenKind::Eof);
    }

    #[test]
    fn single_character_punctuation() {
        assert_eq!(
            scan_kinds("(){},.-+;/*"),
            vec![
                TokenKind::LeftParen,
                TokenKind::RightParen,
                TokenKind::LeftBrace,
                TokenKind::RightBrace,
                TokenKind::Comma,
                TokenKind::Dot,
                TokenKind::Minus,
                TokenKind::Plus,
                TokenKind::Semicolon,
                TokenKind::Slash,
                TokenKind::Star,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn one_and_two_character_operators() {
        assert_eq!(
            scan_kinds("! != = == < <= > >="),
            vec![
                TokenKind::Bang,
                TokenKind::BangEqual,
                TokenKind::Equal,
                TokenKind::EqualEqual,
                TokenKind::Less,
                TokenKind::LessEqual,
                TokenKind::Greater,
                TokenKind::GreaterEqual,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn all_keywords() {
        assert_eq!(
            scan_kinds("and class else false for fun if nil or print return super this true var while"),
            vec![
                TokenKind::And,
                TokenKind::Class,
                TokenKind::Else,
                TokenKind::False,
                TokenKind::For,
                TokenKind::Fun,
                TokenKind::If,
                TokenKind::Nil,
                TokenKind::Or,
                TokenKind::Print,
                TokenKind::Return,
                TokenKind::Super,
                TokenKind::This,
                TokenKind::True,
                TokenKind::Var,
                TokenKind::While,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn keywords_are_case_sensitive_prefix_free() {
        // Near-keywords must fall back to identifiers.
        assert_eq!(
            scan_kinds("android classy NIL falsey"),
            vec![
                TokenKind::Identifier,
                TokenKind::Identifier,
                TokenKind::Identifier,
                TokenKind::Identifier,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn identifier_lexemes_are_source_slices() {
        let source = "foo _bar baz42";
        let tokens = scan_all(source);
        assert_eq!(tokens[0].lexeme, "foo");
        assert_eq!(tokens[1].lexeme, "_bar");
        assert_eq!(tokens[2].lexeme, "baz42");
        for token in &tokens[..3] {
            assert_eq!(token.kind, TokenKind::Identifier);
            assert!(source.contains(token.lexeme));
        }
    }

    #[test]
    fn number_literals() {
        let tokens = scan_all("123 45.67 0.5");
        assert_eq!(tokens[0].lexeme, "123");
        assert_eq!(tokens[1].lexeme, "45.67");
        assert_eq!(tokens[2].lexeme, "0.5");
        for token in &tokens[..3] {
            assert_eq!(token.kind, TokenKind::Number);
        }
    }

    #[test]
    fn trailing_dot_is_not_part_of_the_number() {
        let tokens = scan_all("12.");
        assert_eq!(tokens[0].kind, TokenKind::Number);
        assert_eq!(tokens[0].lexeme, "12");
        assert_eq!(tokens[1].kind, TokenKind::Dot);
    }

    #[test]
    fn string_literal_keeps_its_quotes() {
        let tokens = scan_all("\"hello\"");
        assert_eq!(tokens[0].kind, TokenKind::String);
        assert_eq!(tokens[0].lexeme, "\"hello\"");
    }

    #[test]
    fn multiline_string_counts_lines() {
        let tokens = scan_all("\"a\nb\" end");
        assert_eq!(tokens[0].kind, TokenKind::String);
        assert_eq!(tokens[0].line, 2);
        assert_eq!(tokens[1].kind, TokenKind::Identifier);
        assert_eq!(tokens[1].line, 2);
    }

    #[test]
    fn unterminated_string() {
        let tokens = scan_all("\"oops");
        assert_eq!(tokens[0].kind, TokenKind::Error);
        assert_eq!(tokens[0].lexeme, "Unterminated string.");
    }

    #[test]
    fn unexpected_character() {
        let tokens = scan_all("@");
        assert_eq!(tokens[0].kind, TokenKind::Error);
        assert_eq!(tokens[0].lexeme, "Unexpected character.");
    }

    #[test]
    fn comments_run_to_end_of_line() {
        let tokens = scan_all("1 // the rest is ignored ())\n2");
        assert_eq!(tokens[0].kind, TokenKind::Number);
        assert_eq!(tokens[0].line, 1);
        assert_eq!(tokens[1].kind, TokenKind::Number);
        assert_eq!(tokens[1].line, 2);
        assert_eq!(tokens[2].kind, TokenKind::Eof);
    }

    #[test]
    fn slash_alone_is_not_a_comment() {
        assert_eq!(
            scan_kinds("1 / 2"),
            vec![
                TokenKind::Number,
                TokenKind::Slash,
                TokenKind::Number,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn newlines_advance_the_line_counter() {
        let tokens = scan_all("1\n\n2\r\n3");
        assert_eq!(tokens[0].line, 1);
        assert_eq!(tokens[1].line, 3);
        assert_eq!(tokens[2].line, 4);
    }
}
