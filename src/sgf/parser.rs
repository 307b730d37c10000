//! SGF text parser.
//!
//! Produces a tree of nodes with their properties in file order. Values are
//! unescaped but otherwise kept as raw strings; interpreting them is the
//! reader's job.

use super::SgfError;

/// A node: properties in the order they appear
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Node {
    pub properties: Vec<(String, Vec<String>)>,
}

impl Node {
    /// All values of a property
    pub fn get(&self, ident: &str) -> Option<&[String]> {
        self.properties
            .iter()
            .find(|(id, _)| id == ident)
            .map(|(_, values)| values.as_slice())
    }

    /// First value of a property
    pub fn first(&self, ident: &str) -> Option<&str> {
        self.get(ident)
            .and_then(|values| values.first())
            .map(String::as_str)
    }
}

/// A sequence of nodes followed by variations
#[derive(Debug, Clone, PartialEq)]
pub struct GameTree {
    pub nodes: Vec<Node>,
    pub variations: Vec<GameTree>,
}

impl GameTree {
    /// Nodes of the main line (first variation at every branch)
    pub fn main_line(&self) -> Vec<&Node> {
        let mut line: Vec<&Node> = self.nodes.iter().collect();
        let mut current = self.variations.first();
        while let Some(tree) = current {
            line.extend(tree.nodes.iter());
            current = tree.variations.first();
        }
        line
    }

    /// The root node
    pub fn root(&self) -> &Node {
        // A tree is never built without at least one node
        &self.nodes[0]
    }
}

/// Parse every game tree in an SGF collection
pub fn parse_collection(input: &str) -> Result<Vec<GameTree>, SgfError> {
    let mut parser = Parser {
        input: input.as_bytes(),
        pos: 0,
    };
    let mut trees = Vec::new();

    loop {
        // Anything outside a game tree (BOM, editor junk) is ignored
        while let Some(b) = parser.peek() {
            if b == b'(' {
                break;
            }
            parser.pos += 1;
        }
        if parser.peek().is_none() {
            break;
        }
        trees.push(parser.parse_tree()?);
    }

    if trees.is_empty() {
        return Err(SgfError::NoGameTree);
    }
    Ok(trees)
}

struct Parser<'a> {
    input: &'a [u8],
    pos: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(b) if b.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    fn error(&self, message: impl Into<String>) -> SgfError {
        SgfError::Syntax {
            offset: self.pos,
            message: message.into(),
        }
    }

    fn expect(&mut self, wanted: u8) -> Result<(), SgfError> {
        self.skip_ws();
        match self.peek() {
            Some(b) if b == wanted => {
                self.pos += 1;
                Ok(())
            }
            Some(b) => Err(self.error(format!(
                "expected '{}', found '{}'",
                wanted as char, b as char
            ))),
            None => Err(self.error(format!(
                "unexpected end of input, expected '{}'",
                wanted as char
            ))),
        }
    }

    fn parse_tree(&mut self) -> Result<GameTree, SgfError> {
        self.expect(b'(')?;
        self.skip_ws();

        let mut nodes = Vec::new();
        while self.peek() == Some(b';') {
            nodes.push(self.parse_node()?);
            self.skip_ws();
        }
        if nodes.is_empty() {
            return Err(self.error("game tree has no nodes"));
        }

        let mut variations = Vec::new();
        while self.peek() == Some(b'(') {
            variations.push(self.parse_tree()?);
            self.skip_ws();
        }

        self.expect(b')')?;
        Ok(GameTree { nodes, variations })
    }

    fn parse_node(&mut self) -> Result<Node, SgfError> {
        self.expect(b';')?;
        let mut node = Node::default();
        loop {
            self.skip_ws();
            match self.peek() {
                Some(b) if b.is_ascii_alphabetic() => {
                    let (ident, values) = self.parse_property()?;
                    match node.properties.iter_mut().find(|(id, _)| *id == ident) {
                        Some((_, existing)) => existing.extend(values),
                        None => node.properties.push((ident, values)),
                    }
                }
                _ => break,
            }
        }
        Ok(node)
    }

    fn parse_property(&mut self) -> Result<(String, Vec<String>), SgfError> {
        let start = self.pos;
        let mut ident = String::new();
        while let Some(b) = self.peek() {
            if !b.is_ascii_alphabetic() {
                break;
            }
            // Old long-form identifiers mix in lowercase letters
            if b.is_ascii_uppercase() {
                ident.push(b as char);
            }
            self.pos += 1;
        }
        if ident.is_empty() {
            return Err(SgfError::Syntax {
                offset: start,
                message: "property identifier has no uppercase letters".to_string(),
            });
        }

        let mut values = Vec::new();
        self.skip_ws();
        while self.peek() == Some(b'[') {
            values.push(self.parse_value()?);
            self.skip_ws();
        }
        if values.is_empty() {
            return Err(self.error(format!("property {} has no value", ident)));
        }
        Ok((ident, values))
    }

    fn parse_value(&mut self) -> Result<String, SgfError> {
        let start = self.pos;
        self.expect(b'[')?;
        let mut bytes = Vec::new();
        loop {
            let Some(b) = self.peek() else {
                return Err(SgfError::Syntax {
                    offset: start,
                    message: "unterminated property value".to_string(),
                });
            };
            self.pos += 1;
            match b {
                b']' => break,
                b'\\' => match self.peek() {
                    // Soft line break
                    Some(b'\n') => {
                        self.pos += 1;
                        if self.peek() == Some(b'\r') {
                            self.pos += 1;
                        }
                    }
                    Some(b'\r') => {
                        self.pos += 1;
                        if self.peek() == Some(b'\n') {
                            self.pos += 1;
                        }
                    }
                    Some(escaped) => {
                        bytes.push(escaped);
                        self.pos += 1;
                    }
                    None => {}
                },
                other => bytes.push(other),
            }
        }
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_game() {
        let trees = parse_collection("(;GM[1]FF[4]SZ[9];B[ee];W[cc])").unwrap();
        assert_eq!(trees.len(), 1);
        let line = trees[0].main_line();
        assert_eq!(line.len(), 3);
        assert_eq!(line[0].first("SZ"), Some("9"));
        assert_eq!(line[1].first("B"), Some("ee"));
        assert_eq!(line[2].first("W"), Some("cc"));
    }

    #[test]
    fn test_main_line_follows_first_variation() {
        let trees = parse_collection("(;SZ[9];B[ee](;W[cc];B[gg])(;W[gc]))").unwrap();
        let line = trees[0].main_line();
        let moves: Vec<_> = line
            .iter()
            .filter_map(|n| n.first("B").or_else(|| n.first("W")))
            .collect();
        assert_eq!(moves, vec!["ee", "cc", "gg"]);
    }

    #[test]
    fn test_values_and_escapes() {
        let text = "(;C[a \\] bracket\\\nand more]AB[aa][bb]\n  GN[x\\\\y])";
        let trees = parse_collection(text).unwrap();
        let root = trees[0].root();
        assert_eq!(root.first("C"), Some("a ] bracketand more"));
        assert_eq!(root.get("AB").unwrap(), &["aa".to_string(), "bb".to_string()]);
        assert_eq!(root.first("GN"), Some("x\\y"));
        assert!(root.get("AW").is_none());
    }

    #[test]
    fn test_long_identifiers_and_leading_junk() {
        let trees = parse_collection("\u{feff}junk (;SiZe[13]KoMi[6.5])").unwrap();
        let root = trees[0].root();
        assert_eq!(root.first("SZ"), Some("13"));
        assert_eq!(root.first("KM"), Some("6.5"));
    }

    #[test]
    fn test_utf8_values() {
        let trees = parse_collection("(;PB[李世石]PW[Cho Chikun])").unwrap();
        assert_eq!(trees[0].root().first("PB"), Some("李世石"));
    }

    #[test]
    fn test_errors() {
        assert!(matches!(parse_collection(""), Err(SgfError::NoGameTree)));
        assert!(matches!(
            parse_collection("(;B[aa"),
            Err(SgfError::Syntax { .. })
        ));
        assert!(matches!(
            parse_collection("(;B[aa]"),
            Err(SgfError::Syntax { .. })
        ));
        assert!(matches!(parse_collection("()"), Err(SgfError::Syntax { .. })));
        match parse_collection("(;SZ[9]B)") {
            Err(SgfError::Syntax { message, .. }) => assert!(message.contains("no value")),
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
