//! Fixture writer assembling synthetic pattern data containers.
//!
//! Builds a complete 3.1 or 3.2 container from an intermediate model:
//! strings are deduplicated into a table, node and profile references are
//! resolved to byte offsets in a fixup pass, and the 3.2 side-tables are
//! packed from the per-record reference lists.

use std::collections::HashMap;

/// Number of profile slots in every signature record.
pub const SIGNATURE_PROFILE_SLOTS: u32 = 4;
/// Number of node slots in every 3.1 signature record.
pub const SIGNATURE_NODE_SLOTS: u32 = 5;

#[derive(Default)]
pub struct StringTable {
    entries: Vec<String>,
    ids: HashMap<String, usize>,
}

impl StringTable {
    pub fn add(&mut self, value: &str) -> usize {
        if let Some(&id) = self.ids.get(value) {
            return id;
        }
        let id = self.entries.len();
        self.entries.push(value.to_string());
        self.ids.insert(value.to_string(), id);
        id
    }

    /// Byte offset of each entry inside the strings section.
    fn offsets(&self) -> Vec<u32> {
        let mut offsets = Vec::with_capacity(self.entries.len());
        let mut position = 0u32;
        for entry in &self.entries {
            offsets.push(position);
            position += 2 + entry.len() as u32 + 1; // length prefix + bytes + NUL
        }
        offsets
    }

    fn body(&self) -> Vec<u8> {
        let mut body = Vec::new();
        for entry in &self.entries {
            body.extend_from_slice(&((entry.len() + 1) as u16).to_le_bytes());
            body.extend_from_slice(entry.as_bytes());
            body.push(0);
        }
        body
    }
}

pub struct FxComponent {
    pub component_id: u8,
    pub name: usize,
    /// Index into `Fixture::profiles`.
    pub default_profile: usize,
    /// String ids of the explicit header list (3.2 only).
    pub headers: Vec<usize>,
}

pub struct FxProperty {
    pub component: u8,
    pub name: usize,
    pub description: usize,
    pub category: usize,
    pub url: usize,
    pub value_type: u8,
    pub default_value: i32,
    pub first_value: u32,
    pub last_value: u32,
}

pub struct FxValue {
    pub property: u16,
    pub name: usize,
    pub description: usize,
    pub url: usize,
}

pub struct FxProfile {
    pub component: u8,
    pub profile_id: u32,
    pub values: Vec<u32>,
    pub signatures: Vec<u32>,
}

pub struct FxSignature {
    /// Indexes into `Fixture::profiles`.
    pub profiles: Vec<usize>,
    /// Indexes into `Fixture::nodes`, in match order.
    pub nodes: Vec<usize>,
    pub rank: u32,
    pub flags: u8,
}

pub enum FxChildChars {
    /// Up to four characters packed into the index record.
    Packed(&'static [u8]),
    /// String id of a longer character run.
    Stringed(usize),
}

pub struct FxChild {
    pub chars: FxChildChars,
    /// Index into `Fixture::nodes`.
    pub node: usize,
}

pub struct FxNode {
    pub position: i16,
    pub next_character_position: i16,
    /// Index into `Fixture::nodes`; `None` for roots.
    pub parent: Option<usize>,
    /// String id of the matched characters; `None` for roots.
    pub characters: Option<usize>,
    pub children: Vec<FxChild>,
    /// `(value, node index)`
    pub numeric_children: Vec<(i16, usize)>,
    pub ranked_signatures: Vec<u32>,
}

pub struct Fixture {
    pub version: (u16, u16),
    pub copyright: String,
    pub tag: [u8; 16],
    pub strings: StringTable,
    pub components: Vec<FxComponent>,
    /// Map name string ids.
    pub maps: Vec<usize>,
    pub properties: Vec<FxProperty>,
    pub values: Vec<FxValue>,
    pub profiles: Vec<FxProfile>,
    pub signatures: Vec<FxSignature>,
    pub nodes: Vec<FxNode>,
    /// Indexes into `nodes`.
    pub root_nodes: Vec<usize>,
    pub ranked_signature_indexes: Vec<u32>,
}

impl Fixture {
    fn is_v32(&self) -> bool {
        self.version == (3, 2)
    }

    fn preamble(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&self.version.0.to_le_bytes());
        out.extend_from_slice(&self.version.1.to_le_bytes());
        out.extend_from_slice(&7u32.to_le_bytes()); // format revision
        out.extend_from_slice(&self.tag);
        out.extend_from_slice(&(self.copyright.len() as u16).to_le_bytes());
        out.extend_from_slice(self.copyright.as_bytes());
        // published / next update
        for (year, month, day) in [(2024u16, 6u8, 1u8), (2024, 7, 1)] {
            out.extend_from_slice(&year.to_le_bytes());
            out.push(month);
            out.push(day);
        }
        out.extend_from_slice(&(self.profiles.len() as u32).to_le_bytes()); // combinations
        out.extend_from_slice(&512u16.to_le_bytes()); // max user-agent length
        out.extend_from_slice(&8u16.to_le_bytes()); // min user-agent length
        out.push(b' ');
        out.push(b'~');
        out.extend_from_slice(&(self.signatures.len() as u32).to_le_bytes());
        out.extend_from_slice(&SIGNATURE_PROFILE_SLOTS.to_le_bytes());
        out.extend_from_slice(&SIGNATURE_NODE_SLOTS.to_le_bytes());
        out.extend_from_slice(&2u16.to_le_bytes()); // max values
        if self.is_v32() {
            out.extend_from_slice(&(self.signatures.len() as u32).to_le_bytes()); // max rank
        }
        out
    }

    /// Byte offset of each profile record inside the profiles section.
    fn profile_offsets_table(&self) -> Vec<u32> {
        let mut offsets = Vec::with_capacity(self.profiles.len());
        let mut position = 0u32;
        for profile in &self.profiles {
            offsets.push(position);
            position += 13 + 4 * (profile.values.len() + profile.signatures.len()) as u32;
        }
        offsets
    }

    fn profiles_body(&self) -> Vec<u8> {
        let mut body = Vec::new();
        for profile in &self.profiles {
            body.push(profile.component);
            body.extend_from_slice(&profile.profile_id.to_le_bytes());
            body.extend_from_slice(&(profile.values.len() as u32).to_le_bytes());
            body.extend_from_slice(&(profile.signatures.len() as u32).to_le_bytes());
            for &value in &profile.values {
                body.extend_from_slice(&value.to_le_bytes());
            }
            for &signature in &profile.signatures {
                body.extend_from_slice(&signature.to_le_bytes());
            }
        }
        body
    }

    fn node_length(&self, node: &FxNode) -> u32 {
        let base = 16
            + 9 * node.children.len() as u32
            + 6 * node.numeric_children.len() as u32;
        if self.is_v32() {
            base + 2 + if node.ranked_signatures.is_empty() { 0 } else { 4 }
        } else {
            base + 4 + 4 * node.ranked_signatures.len() as u32
        }
    }

    /// Byte offset of each node record inside the nodes section.
    fn node_offsets_table(&self) -> Vec<u32> {
        let mut offsets = Vec::with_capacity(self.nodes.len());
        let mut position = 0u32;
        for node in &self.nodes {
            offsets.push(position);
            position += self.node_length(node);
        }
        offsets
    }

    /// Start index of each node's run in the node-ranked-signature table.
    fn node_ranked_firsts(&self) -> (Vec<u32>, Vec<u32>) {
        let mut table = Vec::new();
        let mut firsts = Vec::with_capacity(self.nodes.len());
        for node in &self.nodes {
            firsts.push(table.len() as u32);
            table.extend_from_slice(&node.ranked_signatures);
        }
        (firsts, table)
    }

    fn nodes_body(&self, string_offsets: &[u32]) -> Vec<u8> {
        let node_offsets = self.node_offsets_table();
        let (ranked_firsts, _) = self.node_ranked_firsts();
        let mut body = Vec::new();
        for (index, node) in self.nodes.iter().enumerate() {
            body.extend_from_slice(&node.position.to_le_bytes());
            body.extend_from_slice(&node.next_character_position.to_le_bytes());
            let parent = node
                .parent
                .map(|p| node_offsets[p] as i32)
                .unwrap_or(-1);
            body.extend_from_slice(&parent.to_le_bytes());
            let characters = node
                .characters
                .map(|s| string_offsets[s] as i32)
                .unwrap_or(-1);
            body.extend_from_slice(&characters.to_le_bytes());
            body.extend_from_slice(&(node.children.len() as u16).to_le_bytes());
            body.extend_from_slice(&(node.numeric_children.len() as u16).to_le_bytes());
            let ranked = node.ranked_signatures.len() as u32;
            if self.is_v32() {
                body.extend_from_slice(&(ranked as u16).to_le_bytes());
            } else {
                body.extend_from_slice(&ranked.to_le_bytes());
            }
            for child in &node.children {
                match &child.chars {
                    FxChildChars::Packed(chars) => {
                        assert!(chars.len() <= 4, "packed child characters fit in 4 bytes");
                        body.push(0);
                        let mut packed = [0u8; 4];
                        packed[..chars.len()].copy_from_slice(chars);
                        body.extend_from_slice(&packed);
                    }
                    FxChildChars::Stringed(id) => {
                        body.push(1);
                        body.extend_from_slice(&(string_offsets[*id] as i32).to_le_bytes());
                    }
                }
                body.extend_from_slice(&node_offsets[child.node].to_le_bytes());
            }
            for &(value, target) in &node.numeric_children {
                body.extend_from_slice(&value.to_le_bytes());
                body.extend_from_slice(&node_offsets[target].to_le_bytes());
            }
            if self.is_v32() {
                if !node.ranked_signatures.is_empty() {
                    body.extend_from_slice(&ranked_firsts[index].to_le_bytes());
                }
            } else {
                for &signature in &node.ranked_signatures {
                    body.extend_from_slice(&signature.to_le_bytes());
                }
            }
        }
        body
    }

    fn signatures_body(
        &self,
        profile_offsets: &[u32],
        node_offsets: &[u32],
    ) -> (Vec<u8>, Vec<u32>) {
        let mut body = Vec::new();
        let mut node_offset_table = Vec::new();
        for signature in &self.signatures {
            assert!(signature.profiles.len() <= SIGNATURE_PROFILE_SLOTS as usize);
            for slot in 0..SIGNATURE_PROFILE_SLOTS as usize {
                let value = signature
                    .profiles
                    .get(slot)
                    .map(|&p| profile_offsets[p] as i32)
                    .unwrap_or(-1);
                body.extend_from_slice(&value.to_le_bytes());
            }
            if self.is_v32() {
                body.push(signature.nodes.len() as u8);
                body.extend_from_slice(&(node_offset_table.len() as u32).to_le_bytes());
                body.extend_from_slice(&signature.rank.to_le_bytes());
                body.push(signature.flags);
                for &node in &signature.nodes {
                    node_offset_table.push(node_offsets[node]);
                }
            } else {
                assert!(signature.nodes.len() <= SIGNATURE_NODE_SLOTS as usize);
                for slot in 0..SIGNATURE_NODE_SLOTS as usize {
                    let value = signature
                        .nodes
                        .get(slot)
                        .map(|&n| node_offsets[n] as i32)
                        .unwrap_or(-1);
                    body.extend_from_slice(&value.to_le_bytes());
                }
            }
        }
        (body, node_offset_table)
    }

    /// Serialize the whole container.
    pub fn build(&self) -> Vec<u8> {
        let string_offsets = self.strings.offsets();
        let profile_offsets = self.profile_offsets_table();
        let node_offsets = self.node_offsets_table();

        let mut components_body = Vec::new();
        for component in &self.components {
            components_body.push(component.component_id);
            components_body.extend_from_slice(&string_offsets[component.name].to_le_bytes());
            components_body
                .extend_from_slice(&profile_offsets[component.default_profile].to_le_bytes());
            if self.is_v32() {
                components_body
                    .extend_from_slice(&(component.headers.len() as u16).to_le_bytes());
                for &header in &component.headers {
                    components_body.extend_from_slice(&string_offsets[header].to_le_bytes());
                }
            }
        }

        let mut maps_body = Vec::new();
        for &name in &self.maps {
            maps_body.extend_from_slice(&string_offsets[name].to_le_bytes());
        }

        let mut properties_body = Vec::new();
        for (index, property) in self.properties.iter().enumerate() {
            properties_body.push(property.component);
            properties_body.push(index as u8); // display order
            properties_body.extend_from_slice(&[1, 0, 1, 0, 1]); // mandatory..show
            properties_body.push(property.value_type);
            properties_body.extend_from_slice(&property.default_value.to_le_bytes());
            for offset in [
                string_offsets[property.name],
                string_offsets[property.description],
                string_offsets[property.category],
                string_offsets[property.url],
                property.first_value,
                property.last_value,
                0, // map count
                0, // first map index
            ] {
                properties_body.extend_from_slice(&offset.to_le_bytes());
            }
        }

        let mut values_body = Vec::new();
        for value in &self.values {
            values_body.extend_from_slice(&value.property.to_le_bytes());
            for offset in [
                string_offsets[value.name],
                string_offsets[value.description],
                string_offsets[value.url],
            ] {
                values_body.extend_from_slice(&offset.to_le_bytes());
            }
        }

        let (signatures_body, signature_node_offset_table) =
            self.signatures_body(&profile_offsets, &node_offsets);
        let (_, node_ranked_table) = self.node_ranked_firsts();

        let mut ranked_body = Vec::new();
        for &index in &self.ranked_signature_indexes {
            ranked_body.extend_from_slice(&index.to_le_bytes());
        }

        let mut root_nodes_body = Vec::new();
        for &node in &self.root_nodes {
            root_nodes_body.extend_from_slice(&node_offsets[node].to_le_bytes());
        }

        let mut profile_offsets_body = Vec::new();
        for (index, profile) in self.profiles.iter().enumerate() {
            profile_offsets_body.extend_from_slice(&profile.profile_id.to_le_bytes());
            profile_offsets_body.extend_from_slice(&profile_offsets[index].to_le_bytes());
        }

        // section order is fixed per version
        let mut sections: Vec<(Vec<u8>, u32)> = vec![
            (self.strings.body(), self.strings.entries.len() as u32),
            (components_body, self.components.len() as u32),
            (maps_body, self.maps.len() as u32),
            (properties_body, self.properties.len() as u32),
            (values_body, self.values.len() as u32),
            (self.profiles_body(), self.profiles.len() as u32),
            (signatures_body, self.signatures.len() as u32),
        ];
        if self.is_v32() {
            let mut table_body = Vec::new();
            for &offset in &signature_node_offset_table {
                table_body.extend_from_slice(&offset.to_le_bytes());
            }
            sections.push((table_body, signature_node_offset_table.len() as u32));

            let mut ranked_table_body = Vec::new();
            for &index in &node_ranked_table {
                ranked_table_body.extend_from_slice(&index.to_le_bytes());
            }
            sections.push((ranked_table_body, node_ranked_table.len() as u32));
        }
        sections.push((ranked_body, self.ranked_signature_indexes.len() as u32));
        sections.push((self.nodes_body(&string_offsets), self.nodes.len() as u32));
        sections.push((root_nodes_body, self.root_nodes.len() as u32));
        sections.push((profile_offsets_body, self.profiles.len() as u32));

        let mut out = self.preamble();
        for (body, count) in sections {
            let start = out.len() as u32 + 12;
            out.extend_from_slice(&start.to_le_bytes());
            out.extend_from_slice(&(body.len() as u32).to_le_bytes());
            out.extend_from_slice(&count.to_le_bytes());
            out.extend_from_slice(&body);
        }
        out
    }
}

/// Build a fixture with the given property count, shaped like a lite data
/// export: four components, one profile per component, two values per
/// property and a small node tree.
pub fn fixture(version: (u16, u16), property_count: usize) -> Fixture {
    let mut strings = StringTable::default();

    let component_names = [
        "HardwarePlatform",
        "SoftwarePlatform",
        "BrowserUA",
        "Crawler",
    ];
    let user_agent = strings.add("User-Agent");

    let mut components = Vec::new();
    for (index, name) in component_names.iter().enumerate() {
        let name = strings.add(name);
        components.push(FxComponent {
            component_id: index as u8 + 1,
            name,
            default_profile: index,
            headers: vec![user_agent],
        });
    }

    let maps = vec![strings.add("Premium"), strings.add("Lite")];

    let mut properties = Vec::new();
    let mut values = Vec::new();
    for index in 0..property_count {
        let name = strings.add(&format!("Property{}", index));
        let description = strings.add(&format!("Describes property {}.", index));
        let category = strings.add("General");
        let url = strings.add("https://example.com/properties");
        let first_value = values.len() as u32;
        for suffix in ["A", "B"] {
            values.push(FxValue {
                property: index as u16,
                name: strings.add(&format!("Value {} {}", index, suffix)),
                description: strings.add(&format!("Value {} of property {}.", suffix, index)),
                url: strings.add("https://example.com/values"),
            });
        }
        properties.push(FxProperty {
            component: (index % 4) as u8,
            name,
            description,
            category,
            url,
            value_type: 0,
            default_value: first_value as i32,
            first_value,
            last_value: first_value + 1,
        });
    }

    let mut profiles = Vec::new();
    for component in 0..4u8 {
        let value_indexes: Vec<u32> = properties
            .iter()
            .enumerate()
            .filter(|(_, p)| p.component == component)
            .map(|(index, _)| 2 * index as u32)
            .collect();
        profiles.push(FxProfile {
            component,
            profile_id: 10_000 + u32::from(component),
            values: value_indexes,
            signatures: vec![u32::from(component)],
        });
    }

    let token = strings.add("Mozilla/5.0");
    let nodes = vec![
        FxNode {
            position: -1,
            next_character_position: 0,
            parent: None,
            characters: None,
            children: vec![
                FxChild {
                    chars: FxChildChars::Packed(b"Moz"),
                    node: 1,
                },
                FxChild {
                    chars: FxChildChars::Stringed(token),
                    node: 2,
                },
            ],
            numeric_children: vec![(50, 3)],
            ranked_signatures: vec![],
        },
        FxNode {
            position: 0,
            next_character_position: 3,
            parent: Some(0),
            characters: Some(token),
            children: vec![FxChild {
                chars: FxChildChars::Packed(b"5.0"),
                node: 3,
            }],
            numeric_children: vec![],
            ranked_signatures: vec![0, 1],
        },
        FxNode {
            position: 0,
            next_character_position: 11,
            parent: Some(0),
            characters: Some(token),
            children: vec![],
            numeric_children: vec![],
            ranked_signatures: vec![2],
        },
        FxNode {
            position: 8,
            next_character_position: 11,
            parent: Some(1),
            characters: Some(token),
            children: vec![],
            numeric_children: vec![],
            ranked_signatures: vec![1, 3],
        },
    ];

    let mut signatures = Vec::new();
    for index in 0..6usize {
        signatures.push(FxSignature {
            profiles: vec![index % 4, (index + 1) % 4],
            nodes: match index % 3 {
                0 => vec![0, 1],
                1 => vec![0, 2, 3],
                _ => vec![0, 1, 3],
            },
            rank: index as u32,
            flags: (index % 2) as u8,
        });
    }

    let ranked_signature_indexes: Vec<u32> = (0..signatures.len() as u32).rev().collect();

    Fixture {
        version,
        copyright: "Synthetic device data for tests".to_string(),
        tag: *b"patterndb-test!!",
        strings,
        components,
        maps,
        properties,
        values,
        profiles,
        signatures,
        nodes,
        root_nodes: vec![0],
        ranked_signature_indexes,
    }
}

/// Lite-shaped 3.2 fixture: 130 properties, matching the lite export.
pub fn lite_v32() -> Vec<u8> {
    fixture((3, 2), 130).build()
}

/// Premium-shaped 3.2 fixture: a larger property set.
pub fn premium_v32() -> Vec<u8> {
    fixture((3, 2), 227).build()
}

/// Lite-shaped 3.1 fixture.
pub fn lite_v31() -> Vec<u8> {
    fixture((3, 1), 130).build()
}
