//! Recursive-descent scan of one evio event into an [`EvioTree`]: decode a
//! structure header, recurse into structural children, stop at primitive
//! leaves.

use crate::byte_order::ByteOrder;
use crate::data_type::DataType;
use crate::error::{HipoError, Result};
use crate::evio::node::{EvioNode, EvioTree};
use crate::header::structure::{BankHeader, SegmentHeader, TagSegmentHeader};

struct StructureFields {
    tag: u16,
    num: u8,
    data_type: DataType,
    padding: u8,
    header_len_bytes: usize,
    data_position: usize,
    data_length: usize,
    length_field: u32,
}

fn decode_structure_header(buf: &[u8], pos: usize, kind: DataType, order: ByteOrder) -> Result<StructureFields> {
    match kind {
        DataType::Bank => {
            let h = BankHeader::decode(buf, pos, order)?;
            let header_len_bytes = BankHeader::SIZE_BYTES;
            let data_length = (h.length_words.checked_sub(1).ok_or_else(|| HipoError::MalformedHeader {
                offset: pos as u64,
                reason: "bank length word is 0, too short to hold its own tag/num word".to_string(),
            })? * 4) as usize;
            Ok(StructureFields {
                tag: h.tag,
                num: h.num,
                data_type: h.data_type,
                padding: h.padding,
                header_len_bytes,
                data_position: pos + header_len_bytes,
                data_length,
                length_field: h.length_words,
            })
        }
        DataType::Segment => {
            let h = SegmentHeader::decode(buf, pos, order)?;
            let header_len_bytes = SegmentHeader::SIZE_BYTES;
            Ok(StructureFields {
                tag: h.tag as u16,
                num: 0,
                data_type: h.data_type,
                padding: h.padding,
                header_len_bytes,
                data_position: pos + header_len_bytes,
                data_length: h.length_words as usize * 4,
                length_field: h.length_words as u32,
            })
        }
        DataType::TagSegment => {
            let h = TagSegmentHeader::decode(buf, pos, order)?;
            let header_len_bytes = TagSegmentHeader::SIZE_BYTES;
            Ok(StructureFields {
                tag: h.tag,
                num: 0,
                data_type: h.data_type,
                padding: 0,
                header_len_bytes,
                data_position: pos + header_len_bytes,
                data_length: h.length_words as usize * 4,
                length_field: h.length_words as u32,
            })
        }
        other => Err(HipoError::BadFormat {
            reason: format!("{other:?} is not a structure kind that can front a container"),
        }),
    }
}

/// Decode the structure rooted at `pos` (and, if it is a container, every
/// descendant) into a flat arena. `kind` names the structure kind of the
/// node at `pos` itself, not its children.
fn build_node(buf: &[u8], pos: usize, kind: DataType, order: ByteOrder, parent: Option<usize>, nodes: &mut Vec<EvioNode>) -> Result<usize> {
    let fields = decode_structure_header(buf, pos, kind, order)?;
    let total_len = (fields.data_position - pos) + fields.data_length;
    if buf.len() < pos + total_len {
        return Err(HipoError::TruncatedBuffer {
            offset: pos,
            needed: total_len,
            available: buf.len().saturating_sub(pos),
        });
    }

    let idx = nodes.len();
    nodes.push(EvioNode {
        tag: fields.tag,
        num: fields.num,
        data_type: fields.data_type,
        padding: fields.padding,
        position: pos,
        length: fields.length_field,
        data_position: fields.data_position,
        data_length: fields.data_length,
        byte_order: order,
        parent,
        children: Vec::new(),
    });

    if fields.data_type.is_structure() {
        let mut child_pos = fields.data_position;
        let end = fields.data_position + fields.data_length;
        let min_header = match fields.data_type {
            DataType::Bank => BankHeader::SIZE_BYTES,
            _ => SegmentHeader::SIZE_BYTES,
        };
        while child_pos + min_header <= end {
            let child_idx = build_node(buf, child_pos, fields.data_type, order, Some(idx), nodes)?;
            let child_len = nodes[child_idx].total_len_bytes();
            nodes[idx].children.push(child_idx);
            child_pos += child_len;
        }
        if child_pos != end {
            return Err(HipoError::MalformedHeader {
                offset: pos as u64,
                reason: format!("container data ended at byte {child_pos}, header declared end at {end}"),
            });
        }
    }

    Ok(idx)
}

fn collect_preorder(nodes: &[EvioNode], index: usize, out: &mut Vec<usize>) {
    out.push(index);
    for &child in &nodes[index].children {
        collect_preorder(nodes, child, out);
    }
}

/// Scan one top-level event (always a bank) starting at `pos` in `buf`.
pub fn extract_event(buf: &[u8], pos: usize, order: ByteOrder) -> Result<EvioTree> {
    let mut nodes = Vec::new();
    let root = build_node(buf, pos, DataType::Bank, order, None, &mut nodes)?;
    let mut all_nodes = Vec::with_capacity(nodes.len());
    collect_preorder(&nodes, root, &mut all_nodes);
    log::trace!("scanned event at offset {pos}: {} nodes", nodes.len());
    Ok(EvioTree { nodes, root, all_nodes })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::structure::BankHeader;

    fn encode_bank(tag: u16, data_type: DataType, num: u8, data: &[u8], order: ByteOrder) -> Vec<u8> {
        let length_words = 1 + (data.len() / 4) as u32;
        let header = BankHeader {
            length_words,
            tag,
            data_type,
            padding: 0,
            num,
        };
        let mut out = header.encode(order).to_vec();
        out.extend_from_slice(data);
        out
    }

    #[test]
    fn scans_a_leaf_bank() {
        let order = ByteOrder::Little;
        let mut payload = [0u8; 8];
        order.write_u32(&mut payload[0..], 1);
        order.write_u32(&mut payload[4..], 2);
        let buf = encode_bank(10, DataType::Uint32, 0, &payload, order);

        let tree = extract_event(&buf, 0, order).unwrap();
        assert_eq!(tree.nodes.len(), 1);
        let root = tree.root();
        assert_eq!(root.tag, 10);
        assert_eq!(root.data_type, DataType::Uint32);
        assert_eq!(root.data_length, 8);
        assert!(root.is_leaf());
    }

    #[test]
    fn scans_nested_banks() {
        let order = ByteOrder::Big;
        let leaf_data = [0u8; 4];
        let inner = encode_bank(2, DataType::Int32, 0, &leaf_data, order);
        let outer = encode_bank(1, DataType::Bank, 0, &inner, order);

        let tree = extract_event(&outer, 0, order).unwrap();
        assert_eq!(tree.nodes.len(), 2);
        let root = tree.root();
        assert_eq!(root.children.len(), 1);
        let child = tree.get(root.children[0]);
        assert_eq!(child.tag, 2);
        assert_eq!(child.parent, Some(tree.root));
        assert_eq!(tree.all_nodes, vec![tree.root, root.children[0]]);
    }

    #[test]
    fn truncated_bank_data_is_reported() {
        let order = ByteOrder::Little;
        let header = BankHeader {
            length_words: 100,
            tag: 1,
            data_type: DataType::Uint32,
            padding: 0,
            num: 0,
        };
        let buf = header.encode(order).to_vec();
        let err = extract_event(&buf, 0, order).unwrap_err();
        assert!(matches!(err, HipoError::TruncatedBuffer { .. }));
    }
}
