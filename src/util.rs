use std::ops::RangeFrom;

use nom::error::{make_error, ErrorKind, ParseError};
use nom::{Err, IResult, InputIter, InputLength, Slice};

use crate::Error;

pub fn be_u48<I, E: ParseError<I>>(input: I) -> IResult<I, u64, E>
where
    I: Slice<RangeFrom<usize>> + InputIter<Item = u8> + InputLength,
{
    let bound: usize = 6;

    if input.input_len() < bound {
        Err(Err::Error(make_error(input, ErrorKind::Eof)))
    } else {
        let mut res = 0u64;

        for byte in input.iter_elements().take(bound) {
            res = (res << 8) + byte as u64;
        }

        Ok((input.slice(bound..), res))
    }
}

/// Write the low `width` bytes of `value` big-endian.
///
/// Fails if `value` does not fit, since a truncated length would silently
/// change the meaning of an override.
pub fn put_uint(output: &mut Vec<u8>, value: u64, width: usize) -> Result<(), Error> {
    if width < 8 && value >> (width * 8) != 0 {
        return Err(Error::MalformedInput(format!(
            "value {} does not fit in {} bytes",
            value, width
        )));
    }
    output.extend_from_slice(&value.to_be_bytes()[8 - width..]);
    Ok(())
}

/// Fail unless the parser consumed all of `rest`.
pub fn all_consumed(rest: &[u8]) -> IResult<&[u8], ()> {
    if rest.is_empty() {
        Ok((rest, ()))
    } else {
        Err(Err::Failure(make_error(rest, ErrorKind::LengthValue)))
    }
}
