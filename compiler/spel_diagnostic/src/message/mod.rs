//! Message codes.
//!
//! Codes follow the `ELnnnnE` scheme so messages stay greppable and match
//! what users of other SpEL implementations already search for. Templates
//! use positional `{0}`, `{1}` placeholders.

use std::fmt;

macro_rules! messages {
    ($( $(#[$doc:meta])* $variant:ident => $code:literal, $template:literal; )*) => {
        /// A message code with its template.
        #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
        pub enum SpelMessage {
            $( $(#[$doc])* $variant, )*
        }

        impl SpelMessage {
            /// All messages, in code order.
            pub const ALL: &'static [SpelMessage] = &[$(SpelMessage::$variant),*];

            /// Stable code, e.g. `EL1004E`.
            pub const fn code(self) -> &'static str {
                match self {
                    $( SpelMessage::$variant => $code, )*
                }
            }

            /// Unformatted template text.
            pub const fn template(self) -> &'static str {
                match self {
                    $( SpelMessage::$variant => $template, )*
                }
            }
        }
    };
}

messages! {
    TypeConversionError => "EL1001E", "Type conversion problem, cannot convert from {0} to {1}";
    ConstructorNotFound => "EL1002E", "Constructor call: No suitable constructor found on type {0} for arguments {1}";
    ConstructorInvocationProblem => "EL1003E", "A problem occurred whilst attempting to construct an object of type '{0}' using arguments '{1}'";
    MethodNotFound => "EL1004E", "Method call: Method {0} cannot be found on type {1}";
    TypeNotFound => "EL1005E", "Type cannot be found '{0}'";
    FunctionNotDefined => "EL1006E", "Function '{0}' could not be found";
    PropertyOrFieldNotReadableOnNull => "EL1007E", "Property or field '{0}' cannot be found on null";
    PropertyOrFieldNotReadable => "EL1008E", "Property or field '{0}' cannot be found on object of type '{1}' - maybe not public or not valid?";
    PropertyOrFieldNotWritableOnNull => "EL1009E", "Property or field '{0}' cannot be set on null";
    PropertyOrFieldNotWritable => "EL1010E", "Property or field '{0}' cannot be set on object of type '{1}' - maybe not public or not writable?";
    MethodCallOnNullObjectNotAllowed => "EL1011E", "Method call: Attempted to call method {0} on null context object";
    CannotIndexIntoNullValue => "EL1012E", "Cannot index into a null value";
    NotComparable => "EL1013E", "Cannot compare instances of {0} and {1}";
    IncorrectNumberOfArgumentsToFunction => "EL1014E", "Incorrect number of arguments for function '{0}': {1} supplied but function takes {2}";
    InvalidTypeForSelection => "EL1015E", "Cannot perform selection on input data of type '{0}'";
    ResultOfSelectionCriteriaIsNotBoolean => "EL1016E", "Result of selection criteria is not boolean";
    BetweenRightOperandMustBeTwoElementList => "EL1017E", "Right operand for the 'between' operator has to be a two-element list";
    InvalidPattern => "EL1018E", "Pattern is not valid '{0}'";
    ProjectionNotSupportedOnType => "EL1019E", "Projection is not supported on the type '{0}'";
    ExceptionDuringPropertyRead => "EL1021E", "A problem occurred whilst attempting to access the property '{0}': '{1}'";
    FunctionReferenceCannotBeInvoked => "EL1022E", "The value '{0}' referenced by variable '{1}' is not a function";
    ExceptionDuringFunctionCall => "EL1023E", "A problem occurred whilst attempting to invoke the function '{0}': '{1}'";
    CollectionIndexOutOfBounds => "EL1025E", "The collection has '{0}' elements, index '{1}' is invalid";
    StringIndexOutOfBounds => "EL1026E", "The string has '{0}' characters, index '{1}' is invalid";
    IndexingNotSupportedForType => "EL1027E", "Indexing into type '{0}' is not supported";
    InstanceofOperatorNeedsClassOperand => "EL1028E", "The operator 'instanceof' needs the right operand to be a type, not a '{0}'";
    ExceptionDuringMethodInvocation => "EL1029E", "A problem occurred when trying to execute method '{0}' on object of type '{1}': '{2}'";
    OperatorNotSupportedBetweenTypes => "EL1030E", "The operator '{0}' is not supported between objects of type '{1}' and '{2}'";
    ProblemLocatingMethod => "EL1031E", "Problem locating method {0} on type {1}";
    SetValueNotSupported => "EL1032E", "setValue(ExpressionState, Object) not supported for '{0}'";
    ExceptionDuringPropertyWrite => "EL1034E", "A problem occurred whilst attempting to set the property '{0}': {1}";
    NotAnInteger => "EL1035E", "The value '{0}' cannot be parsed as an int";
    NotALong => "EL1036E", "The value '{0}' cannot be parsed as a long";
    InvalidFirstOperandForMatchesOperator => "EL1037E", "First operand to matches operator must be a string. '{0}' is not";
    InvalidSecondOperandForMatchesOperator => "EL1038E", "Second operand to matches operator must be a string. '{0}' is not";
    NotAReal => "EL1040E", "The value '{0}' cannot be parsed as a real number";
    MoreInput => "EL1041E", "After parsing a valid expression, there is still more data in the expression: '{0}'";
    NotExpectedToken => "EL1043E", "Unexpected token. Expected '{0}' but was '{1}'";
    Ood => "EL1044E", "Unexpectedly ran out of input";
    NonTerminatingDoubleQuotedString => "EL1045E", "Cannot find terminating \" for string";
    NonTerminatingQuotedString => "EL1046E", "Cannot find terminating ' for string";
    RealCannotBeLong => "EL1048E", "Real number cannot be suffixed with a long (L or l) suffix";
    UnexpectedDataAfterDot => "EL1049E", "Unexpected data after '.': '{0}'";
    MissingConstructorArgs => "EL1050E", "The arguments '(...)' for the constructor call are missing";
    RunOutOfArguments => "EL1051E", "Unexpectedly ran out of arguments";
    NoBeanResolverRegistered => "EL1057E", "No bean resolver registered in the context to resolve access to bean '{0}'";
    ExceptionDuringBeanResolution => "EL1058E", "A problem occurred when trying to resolve bean '{0}': '{1}'";
    NotAssignable => "EL1068E", "The expression component '{0}' is not assignable";
    MissingSelectionExpression => "EL1071E", "A required selection expression has not been specified";
    ExceptionRunningCompiledExpression => "EL1072E", "An exception occurred whilst evaluating a compiled expression";
    MaxRepeatedTextSizeExceeded => "EL1076E", "Repeated text is too long, exceeding the threshold of '{0}' characters";
    MaxExpressionLengthExceeded => "EL1078E", "SpEL expression is too long, exceeding the threshold of '{0}' characters";
    DivisionByZero => "EL1079E", "Division by zero";
    UnexpectedCharacter => "EL1080E", "Unexpected character '{0}'";
}

impl SpelMessage {
    /// Fill `{n}` placeholders from `inserts`; missing inserts render as
    /// `null`, surplus ones are ignored.
    pub fn format(self, inserts: &[String]) -> String {
        let template = self.template();
        let mut out = String::with_capacity(template.len() + 16);
        let mut rest = template;
        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            let Some(close) = after.find('}') else {
                out.push_str(&rest[open..]);
                return out;
            };
            match after[..close].parse::<usize>() {
                Ok(index) => out.push_str(inserts.get(index).map_or("null", String::as_str)),
                Err(_) => {
                    out.push('{');
                    out.push_str(&after[..=close]);
                }
            }
            rest = &after[close + 1..];
        }
        out.push_str(rest);
        out
    }

    /// Whether the lexer or parser raises this message.
    pub fn is_syntax_error(self) -> bool {
        matches!(
            self,
            SpelMessage::NotAnInteger
                | SpelMessage::NotALong
                | SpelMessage::NotAReal
                | SpelMessage::MoreInput
                | SpelMessage::NotExpectedToken
                | SpelMessage::Ood
                | SpelMessage::NonTerminatingDoubleQuotedString
                | SpelMessage::NonTerminatingQuotedString
                | SpelMessage::RealCannotBeLong
                | SpelMessage::UnexpectedDataAfterDot
                | SpelMessage::MissingConstructorArgs
                | SpelMessage::RunOutOfArguments
                | SpelMessage::NotAssignable
                | SpelMessage::MissingSelectionExpression
                | SpelMessage::MaxExpressionLengthExceeded
                | SpelMessage::UnexpectedCharacter
        )
    }
}

impl fmt::Display for SpelMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
