//! Canonical Huffman decode trees.
//!
//! Code lengths come out of the block header; codes are assigned
//! canonically (symbols sorted by length, then symbol order, each code one
//! greater than the previous, shifted left whenever the length grows) and
//! packed into a binary decode tree walked bit by bit.

use super::bits::BitReader;
use crate::{Error, Result};

#[derive(Debug, Default)]
struct Node {
    children: [Option<u32>; 2],
    symbol: Option<u16>,
}

/// A binary decode tree for one of a block's Huffman tables.
#[derive(Debug)]
pub(crate) struct HuffmanTree {
    nodes: Vec<Node>,
}

impl HuffmanTree {
    /// Build a decode tree from per-symbol code lengths.
    pub fn from_lengths(lengths: &[u8]) -> Result<Self> {
        let mut order: Vec<(u8, u16)> = lengths
            .iter()
            .enumerate()
            .map(|(symbol, &len)| (len, symbol as u16))
            .collect();
        order.sort_unstable();

        let mut tree = Self {
            nodes: vec![Node::default()],
        };
        let mut code = 0u32;
        let mut prev_len = order.first().map_or(0, |&(len, _)| len);
        for (len, symbol) in order {
            code <<= len - prev_len;
            prev_len = len;
            if len < 32 && code >> len != 0 {
                // More codes than the lengths can hold.
                return Err(Error::InvalidHuffmanTable);
            }
            tree.insert(code, len, symbol)?;
            code += 1;
        }
        Ok(tree)
    }

    fn insert(&mut self, code: u32, len: u8, symbol: u16) -> Result<()> {
        let mut node = 0usize;
        for depth in (0..len).rev() {
            if self.nodes[node].symbol.is_some() {
                // A shorter code already terminates on this path.
                return Err(Error::InvalidHuffmanTable);
            }
            let bit = ((code >> depth) & 1) as usize;
            node = match self.nodes[node].children[bit] {
                Some(child) => child as usize,
                None => {
                    let child = self.nodes.len();
                    self.nodes.push(Node::default());
                    self.nodes[node].children[bit] = Some(child as u32);
                    child
                }
            };
        }
        let leaf = &mut self.nodes[node];
        if leaf.symbol.is_some() || leaf.children.iter().any(Option::is_some) {
            return Err(Error::InvalidHuffmanTable);
        }
        leaf.symbol = Some(symbol);
        Ok(())
    }

    /// Decode one symbol from the bit stream.
    pub fn decode(&self, bits: &mut BitReader<'_>) -> Result<u16> {
        let mut node = 0usize;
        loop {
            if let Some(symbol) = self.nodes[node].symbol {
                return Ok(symbol);
            }
            let bit = usize::from(bits.read_bit()?);
            node = self.nodes[node].children[bit].ok_or(Error::InvalidHuffmanTable)? as usize;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_canonical_codes() {
        // Lengths {a:1, b:2, c:2} assign a=0, b=10, c=11.
        let tree = HuffmanTree::from_lengths(&[1, 2, 2]).unwrap();
        let data = [0b0_10_11_0_0_0u8];
        let mut bits = BitReader::new(&data);
        assert_eq!(tree.decode(&mut bits).unwrap(), 0);
        assert_eq!(tree.decode(&mut bits).unwrap(), 1);
        assert_eq!(tree.decode(&mut bits).unwrap(), 2);
    }

    #[test]
    fn length_order_breaks_ties_by_symbol() {
        // All lengths 2: codes 00, 01, 10, 11 in symbol order.
        let tree = HuffmanTree::from_lengths(&[2, 2, 2, 2]).unwrap();
        let data = [0b00_01_10_11u8];
        let mut bits = BitReader::new(&data);
        for want in 0..4 {
            assert_eq!(tree.decode(&mut bits).unwrap(), want);
        }
    }

    #[test]
    fn oversubscribed_lengths_rejected() {
        assert!(matches!(
            HuffmanTree::from_lengths(&[1, 1, 1]),
            Err(Error::InvalidHuffmanTable)
        ));
    }

    #[test]
    fn incomplete_tree_path_is_an_error() {
        // {a:1, b:2}: code 11 is unassigned; decoding it must fail, not hang.
        let tree = HuffmanTree::from_lengths(&[1, 2]).unwrap();
        let data = [0b1100_0000u8];
        let mut bits = BitReader::new(&data);
        assert!(matches!(
            tree.decode(&mut bits),
            Err(Error::InvalidHuffmanTable)
        ));
    }
}
