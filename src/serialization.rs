use bytemuck::cast_slice_mut;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io;

use crate::container::{Container, ARRAY_LIMIT};
use crate::store::{ArrayStore, BitmapStore, RunStore, Span, Store, BITMAP_LENGTH};
use crate::ChunkSet;

pub const SERIAL_COOKIE: u16 = 0x3BF8;
pub const SERIAL_COOKIE_NO_RUNCONTAINER: u32 = 0x3BF0;

pub const SERIALIZATION_ARRAY_UINT32: u8 = 1;
pub const SERIALIZATION_CONTAINER: u8 = 2;

// Sizes of header structures
pub const DESCRIPTION_BYTES: usize = 4;
pub const OFFSET_BYTES: usize = 4;

fn invalid_data(message: &'static str) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, message)
}

impl ChunkSet {
    /// Return the size in bytes of the serialized output.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use chunkset::ChunkSet;
    ///
    /// let set1: ChunkSet = (1..4).collect();
    /// let mut bytes = Vec::with_capacity(set1.serialized_size());
    /// set1.serialize_into(&mut bytes).unwrap();
    /// let set2 = ChunkSet::deserialize_from(&bytes[..]).unwrap();
    ///
    /// assert_eq!(set1, set2);
    /// ```
    pub fn serialized_size(&self) -> usize {
        let size = self.containers.len();
        let header_size = if self.has_run_containers() {
            // Cookie + packed run flags, then the descriptive header
            4 + (size + 7) / 8 + DESCRIPTION_BYTES * size
        } else {
            // Cookie + size, descriptive header, then an offset per container
            8 + (DESCRIPTION_BYTES + OFFSET_BYTES) * size
        };
        let container_sizes: usize =
            self.containers.iter().map(|container| body_size(container.store())).sum();
        header_size + container_sizes
    }

    fn has_run_containers(&self) -> bool {
        self.containers.iter().any(|container| matches!(container.store(), Store::Run(_)))
    }

    /// Serialize this bitmap into the portable format.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use chunkset::ChunkSet;
    ///
    /// let set1: ChunkSet = (1..4).collect();
    /// let mut bytes = vec![];
    /// set1.serialize_into(&mut bytes).unwrap();
    /// let set2 = ChunkSet::deserialize_from(&bytes[..]).unwrap();
    ///
    /// assert_eq!(set1, set2);
    /// ```
    pub fn serialize_into<W: io::Write>(&self, mut writer: W) -> io::Result<()> {
        let size = self.containers.len();
        let has_run_containers = self.has_run_containers();

        if has_run_containers {
            writer
                .write_u32::<LittleEndian>(u32::from(SERIAL_COOKIE) | ((size as u32 - 1) << 16))?;
            let mut run_flags = vec![0u8; (size + 7) / 8];
            for (i, container) in self.containers.iter().enumerate() {
                if matches!(container.store(), Store::Run(_)) {
                    run_flags[i / 8] |= 1 << (i % 8);
                }
            }
            writer.write_all(&run_flags)?;
        } else {
            writer.write_u32::<LittleEndian>(SERIAL_COOKIE_NO_RUNCONTAINER)?;
            writer.write_u32::<LittleEndian>(size as u32)?;
        }

        for container in &self.containers {
            writer.write_u16::<LittleEndian>(container.key)?;
            writer.write_u16::<LittleEndian>((container.len() - 1) as u16)?;
        }

        if !has_run_containers {
            let mut offset = (8 + (DESCRIPTION_BYTES + OFFSET_BYTES) * size) as u32;
            for container in &self.containers {
                writer.write_u32::<LittleEndian>(offset)?;
                offset += body_size(container.store()) as u32;
            }
        }

        for container in &self.containers {
            match container.store() {
                Store::Array(values) => {
                    for &value in values.iter() {
                        writer.write_u16::<LittleEndian>(value)?;
                    }
                }
                Store::Bitmap(bits) => {
                    for &word in bits.as_array().iter() {
                        writer.write_u64::<LittleEndian>(word)?;
                    }
                }
                Store::Run(runs) => {
                    writer.write_u16::<LittleEndian>(runs.n_runs() as u16)?;
                    for span in runs.spans() {
                        writer.write_u16::<LittleEndian>(span.start)?;
                        writer.write_u16::<LittleEndian>(span.end - span.start)?;
                    }
                }
            }
        }

        Ok(())
    }

    /// Deserialize a bitmap from the portable format. This method checks
    /// that all of the internal values are valid; if deserializing from a
    /// trusted source consider [ChunkSet::deserialize_unchecked_from].
    ///
    /// # Examples
    ///
    /// ```rust
    /// use chunkset::ChunkSet;
    ///
    /// let set1: ChunkSet = (1..4).collect();
    /// let mut bytes = vec![];
    /// set1.serialize_into(&mut bytes).unwrap();
    /// let set2 = ChunkSet::deserialize_from(&bytes[..]).unwrap();
    ///
    /// assert_eq!(set1, set2);
    /// ```
    pub fn deserialize_from<R: io::Read>(reader: R) -> io::Result<ChunkSet> {
        ChunkSet::deserialize_from_impl(reader, true)
    }

    /// Deserialize a bitmap from the portable format. This method is memory
    /// safe but will not check that the data describes a valid bitmap.
    pub fn deserialize_unchecked_from<R: io::Read>(reader: R) -> io::Result<ChunkSet> {
        ChunkSet::deserialize_from_impl(reader, false)
    }

    fn deserialize_from_impl<R: io::Read>(mut reader: R, validate: bool) -> io::Result<ChunkSet> {
        // The cookie determines which version of the format we are reading
        let (size, has_offsets, has_run_containers) = {
            let cookie = reader.read_u32::<LittleEndian>()?;
            if cookie == SERIAL_COOKIE_NO_RUNCONTAINER {
                (reader.read_u32::<LittleEndian>()? as usize, true, false)
            } else if (cookie as u16) == SERIAL_COOKIE {
                (((cookie >> 16) + 1) as usize, false, true)
            } else {
                return Err(invalid_data("unknown cookie value"));
            }
        };

        if size > u16::MAX as usize + 1 {
            return Err(invalid_data("size is greater than supported"));
        }

        let run_container_flags = if has_run_containers {
            let mut flags = vec![0u8; (size + 7) / 8];
            reader.read_exact(&mut flags)?;
            Some(flags)
        } else {
            None
        };

        let mut description_bytes = vec![0u8; size * DESCRIPTION_BYTES];
        reader.read_exact(&mut description_bytes)?;
        let mut description_bytes = &description_bytes[..];

        if has_offsets {
            let mut offsets = vec![0u8; size * OFFSET_BYTES];
            reader.read_exact(&mut offsets)?;
            drop(offsets); // Not useful when deserializing into memory
        }

        let mut containers = Vec::with_capacity(size);
        let mut last_key = None;

        for i in 0..size {
            let key = description_bytes.read_u16::<LittleEndian>()?;
            let cardinality = u64::from(description_bytes.read_u16::<LittleEndian>()?) + 1;

            if validate {
                if last_key.map_or(false, |last| key <= last) {
                    return Err(invalid_data("keys not strictly increasing"));
                }
                last_key = Some(key);
            }

            let is_run_container = run_container_flags
                .as_ref()
                .map_or(false, |flags| flags[i / 8] & (1 << (i % 8)) != 0);

            let store = if is_run_container {
                let n_runs = reader.read_u16::<LittleEndian>()?;
                let mut pairs = vec![[0u16; 2]; n_runs as usize];
                reader.read_exact(cast_slice_mut(&mut pairs))?;

                let mut spans = Vec::with_capacity(n_runs as usize);
                for [start, len] in pairs {
                    let (start, len) = (u16::from_le(start), u16::from_le(len));
                    let end = start
                        .checked_add(len)
                        .ok_or_else(|| invalid_data("run overflows the container"))?;
                    spans.push(Span::new(start, end));
                }

                let runs = if validate {
                    let runs = RunStore::try_from(spans)
                        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
                    if runs.len() != cardinality {
                        return Err(invalid_data("run cardinality does not match the header"));
                    }
                    runs
                } else {
                    RunStore::from_vec_unchecked(spans)
                };
                Store::Run(runs)
            } else if cardinality <= ARRAY_LIMIT {
                let mut values = vec![0u16; cardinality as usize];
                reader.read_exact(cast_slice_mut(&mut values))?;
                values.iter_mut().for_each(|n| *n = u16::from_le(*n));

                let array = if validate {
                    ArrayStore::try_from(values)
                        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?
                } else {
                    ArrayStore::from_vec_unchecked(values)
                };
                Store::Array(array)
            } else {
                let mut values = Box::new([0u64; BITMAP_LENGTH]);
                reader.read_exact(cast_slice_mut(&mut values[..]))?;
                values.iter_mut().for_each(|n| *n = u64::from_le(*n));

                let bitmap = if validate {
                    BitmapStore::try_from(cardinality, values)
                        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?
                } else {
                    BitmapStore::from_unchecked(cardinality, values)
                };
                Store::Bitmap(bitmap)
            };

            containers.push(Container::from_store(key, store));
        }

        Ok(ChunkSet { containers, copy_on_write: false })
    }

    /// Serialize this bitmap into the non-portable format: whichever is
    /// smaller of a packed `u32` array and the framed portable image.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use chunkset::ChunkSet;
    ///
    /// let set1: ChunkSet = (1..4).collect();
    /// let set2 = ChunkSet::deserialize_compact(&set1.serialize_compact()).unwrap();
    ///
    /// assert_eq!(set1, set2);
    /// ```
    pub fn serialize_compact(&self) -> Vec<u8> {
        let as_values_size = 1 + 4 * self.len() as usize;
        let as_containers_size = 5 + self.serialized_size();
        if as_values_size < as_containers_size {
            let mut bytes = Vec::with_capacity(as_values_size);
            bytes.push(SERIALIZATION_ARRAY_UINT32);
            for value in self.iter() {
                bytes.extend_from_slice(&value.to_le_bytes());
            }
            bytes
        } else {
            let mut bytes = Vec::with_capacity(as_containers_size);
            bytes.push(SERIALIZATION_CONTAINER);
            bytes.extend_from_slice(&(as_containers_size as u32).to_le_bytes());
            self.serialize_into(&mut bytes).expect("writing to a vec cannot fail");
            bytes
        }
    }

    /// Deserialize a bitmap written by [`ChunkSet::serialize_compact`],
    /// dispatching on the leading format tag.
    pub fn deserialize_compact(bytes: &[u8]) -> io::Result<ChunkSet> {
        match bytes.split_first() {
            Some((&SERIALIZATION_ARRAY_UINT32, values)) => {
                if values.len() % 4 != 0 {
                    return Err(invalid_data("truncated value array"));
                }
                let mut set = ChunkSet::new();
                for value in values.chunks_exact(4) {
                    set.insert(u32::from_le_bytes(value.try_into().expect("4-byte chunk")));
                }
                Ok(set)
            }
            Some((&SERIALIZATION_CONTAINER, rest)) => {
                if rest.len() < 4 {
                    return Err(invalid_data("missing length header"));
                }
                let declared =
                    u32::from_le_bytes(rest[..4].try_into().expect("4-byte header")) as usize;
                if declared != bytes.len() {
                    return Err(invalid_data("buffer length does not match the header"));
                }
                ChunkSet::deserialize_from(&rest[4..])
            }
            _ => Err(invalid_data("unknown serialization tag")),
        }
    }
}

fn body_size(store: &Store) -> usize {
    match store {
        Store::Array(values) => 2 * values.len() as usize,
        Store::Bitmap(_) => BITMAP_LENGTH * 8,
        Store::Run(runs) => 2 + 4 * runs.n_runs(),
    }
}

#[cfg(test)]
mod test {
    use crate::arbitrary::chunkset;
    use crate::ChunkSet;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn test_portable_serialization(set in chunkset()) {
            let mut buffer = Vec::with_capacity(set.serialized_size());
            set.serialize_into(&mut buffer).unwrap();
            prop_assert_eq!(buffer.len(), set.serialized_size());
            prop_assert_eq!(&set, &ChunkSet::deserialize_from(buffer.as_slice()).unwrap());
            prop_assert_eq!(&set, &ChunkSet::deserialize_unchecked_from(buffer.as_slice()).unwrap());
        }

        #[test]
        fn test_compact_serialization(set in chunkset()) {
            prop_assert_eq!(&set, &ChunkSet::deserialize_compact(&set.serialize_compact()).unwrap());
        }
    }

    #[test]
    fn test_deserialize_rejects_unknown_cookie() {
        let data = vec![0xDE, 0xAD, 0xBE, 0xEF, 0, 0, 0, 0];
        assert!(ChunkSet::deserialize_from(data.as_slice()).is_err());
    }

    #[test]
    fn test_deserialize_rejects_short_buffer() {
        let set: ChunkSet = (0..100).collect();
        let mut buffer = vec![];
        set.serialize_into(&mut buffer).unwrap();
        assert!(ChunkSet::deserialize_from(&buffer[..buffer.len() - 1]).is_err());
    }

    #[test]
    fn test_deserialize_rejects_overflowing_run() {
        // One run container whose single run starts at 0xFFFF with length 1
        let data = vec![
            0xF8, 0x3B, 0x00, 0x00, // cookie, size - 1 = 0
            0x01, // run flags
            0x00, 0x00, 0x0A, 0x00, // key 0, cardinality 11
            0x01, 0x00, // 1 run
            0xFF, 0xFF, 0x01, 0x00, // start 0xFFFF, length - 1 = 1
        ];
        assert!(ChunkSet::deserialize_from(data.as_slice()).is_err());
    }
}
