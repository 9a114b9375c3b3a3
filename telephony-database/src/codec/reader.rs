/*!
 The forward-only document reader.

 Parses a JSON array of objects as a lazy sequence: each call to `next`
 consumes exactly one element from the underlying byte stream. The cursor is
 finite and not restartable. A top-level value that is not an array, and any
 malformed JSON after it, surface as fatal errors; the iterator fuses after
 the first error.
*/

use std::io::BufRead;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::codec::CodecError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Start,
    FirstElement,
    NextElement,
    Done,
}

/// Streams the elements of a JSON array of objects from the underlying reader
#[derive(Debug)]
pub struct JsonArrayReader<R: BufRead> {
    input: R,
    state: State,
}

impl<R: BufRead> JsonArrayReader<R> {
    pub fn new(input: R) -> Self {
        JsonArrayReader {
            input,
            state: State::Start,
        }
    }

    /// Skip insignificant whitespace and return the next byte without
    /// consuming it
    fn peek_token(&mut self) -> Result<Option<u8>, CodecError> {
        loop {
            let (token, skip) = {
                let buffered = self.input.fill_buf().map_err(CodecError::Io)?;
                if buffered.is_empty() {
                    return Ok(None);
                }
                match buffered
                    .iter()
                    .position(|byte| !matches!(byte, b' ' | b'\t' | b'\n' | b'\r'))
                {
                    Some(position) => (Some(buffered[position]), position),
                    None => (None, buffered.len()),
                }
            };
            self.input.consume(skip);
            if token.is_some() {
                return Ok(token);
            }
        }
    }

    /// Consume the byte returned by the last `peek_token`
    fn bump(&mut self) -> Result<(), CodecError> {
        self.input.fill_buf().map_err(CodecError::Io)?;
        self.input.consume(1);
        Ok(())
    }

    /// Parse one object element starting at the cursor
    fn parse_element(&mut self) -> Result<Map<String, Value>, CodecError> {
        let mut deserializer = serde_json::Deserializer::from_reader(&mut self.input);
        Map::deserialize(&mut deserializer).map_err(CodecError::Parse)
    }

    fn fail(&mut self, error: CodecError) -> Option<Result<Map<String, Value>, CodecError>> {
        self.state = State::Done;
        Some(Err(error))
    }
}

impl<R: BufRead> Iterator for JsonArrayReader<R> {
    type Item = Result<Map<String, Value>, CodecError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.state {
                State::Done => return None,
                State::Start => match self.peek_token() {
                    Ok(Some(b'[')) => {
                        if let Err(why) = self.bump() {
                            return self.fail(why);
                        }
                        self.state = State::FirstElement;
                    }
                    Ok(Some(_)) => return self.fail(CodecError::NotAnArray),
                    Ok(None) => return self.fail(CodecError::UnexpectedEof),
                    Err(why) => return self.fail(why),
                },
                State::FirstElement => match self.peek_token() {
                    Ok(Some(b']')) => {
                        if let Err(why) = self.bump() {
                            return self.fail(why);
                        }
                        self.state = State::Done;
                        return None;
                    }
                    Ok(Some(_)) => {
                        self.state = State::NextElement;
                        let element = self.parse_element();
                        if element.is_err() {
                            self.state = State::Done;
                        }
                        return Some(element);
                    }
                    Ok(None) => return self.fail(CodecError::UnexpectedEof),
                    Err(why) => return self.fail(why),
                },
                State::NextElement => match self.peek_token() {
                    Ok(Some(b',')) => {
                        if let Err(why) = self.bump() {
                            return self.fail(why);
                        }
                        let element = self.parse_element();
                        if element.is_err() {
                            self.state = State::Done;
                        }
                        return Some(element);
                    }
                    Ok(Some(b']')) => {
                        if let Err(why) = self.bump() {
                            return self.fail(why);
                        }
                        self.state = State::Done;
                        return None;
                    }
                    Ok(Some(other)) => return self.fail(CodecError::UnexpectedByte(other as char)),
                    Ok(None) => return self.fail(CodecError::UnexpectedEof),
                    Err(why) => return self.fail(why),
                },
            }
        }
    }
}
